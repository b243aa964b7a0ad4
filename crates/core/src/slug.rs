use std::collections::{HashMap, HashSet};

/// Per-render registry that hands out unique slugs.
///
/// The first occurrence of a slug is returned as-is; later occurrences get
/// the next unused `-N` suffix, starting at 1. A registry lives for exactly
/// one decoration pass.
#[derive(Debug, Default)]
pub struct SlugRegistry {
    used: HashSet<String>,
    next_suffix: HashMap<String, usize>,
}

impl SlugRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Slugifies `text` and registers the result.
    pub fn next_slug(&mut self, text: &str) -> String {
        self.register(slugify(text))
    }

    /// Registers an already-computed slug, disambiguating it if taken.
    ///
    /// # Examples
    ///
    /// ```
    /// use mdsite_core::SlugRegistry;
    ///
    /// let mut registry = SlugRegistry::new();
    /// assert_eq!(registry.register("setup"), "setup");
    /// assert_eq!(registry.register("setup"), "setup-1");
    /// assert_eq!(registry.register("setup"), "setup-2");
    /// ```
    pub fn register(&mut self, base: impl Into<String>) -> String {
        let base = base.into();
        if self.used.insert(base.clone()) {
            return base;
        }

        // A literal heading such as "Setup 1" may already own `setup-1`.
        let counter = self.next_suffix.entry(base.clone()).or_insert(1);
        loop {
            let candidate = format!("{}-{}", base, counter);
            *counter += 1;
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    /// Returns true if `slug` has been handed out.
    pub fn contains(&self, slug: &str) -> bool {
        self.used.contains(slug)
    }

    /// Number of slugs handed out so far.
    pub fn len(&self) -> usize {
        self.used.len()
    }

    /// Returns true if no slug has been handed out.
    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}

/// Converts heading text into a URL-safe identifier.
///
/// 1. Lowercase
/// 2. Drop every character outside `[a-z0-9-]` and whitespace
/// 3. Collapse each whitespace run into a single hyphen
/// 4. Trim leading and trailing hyphens
///
/// Text without any kept character yields an empty slug.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_gap = false;

    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_whitespace() {
            pending_gap = true;
        } else if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' {
            if pending_gap {
                slug.push('-');
                pending_gap = false;
            }
            slug.push(ch);
        }
    }

    slug.trim_matches('-').to_string()
}
