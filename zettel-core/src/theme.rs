//! Dark-theme forcing.
//!
//! The page must render dark from the first paint, so the script runs
//! synchronously while the document is parsed. It writes the theme
//! attribute and marker classes on the root element, then tries to persist
//! the preference. Losing the stored preference only affects later visits,
//! so a storage failure is dropped without a trace.
//!
//! The attribute, class and storage-key names are read by a separate
//! theme-switcher script and must stay in sync with it.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use thiserror::Error;

pub const THEME_ATTRIBUTE: &str = "data-theme";
pub const DARK_VALUE: &str = "dark";
pub const LIGHT_CLASS: &str = "light-mode";
pub const DARK_CLASS: &str = "dark-mode";
pub const STORAGE_KEY: &str = "theme";

static HEAD_OPEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<head(\s[^>]*)?>").unwrap());

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("persistent storage is unavailable")]
    Unavailable,

    #[error("storage access denied: {0}")]
    Denied(String),
}

/// The page's root element
pub trait RootElement {
    fn set_attribute(&mut self, name: &str, value: &str);
    fn remove_class(&mut self, class: &str);
    fn add_class(&mut self, class: &str);
}

/// Durable client-side key/value storage
pub trait PersistentStorage {
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Run a fallible side effect and discard its outcome
pub fn best_effort<E>(op: impl FnOnce() -> Result<(), E>) {
    let _ = op();
}

/// Pin the page to the dark theme
pub fn force_dark<R, S>(root: &mut R, storage: &mut S)
where
    R: RootElement + ?Sized,
    S: PersistentStorage + ?Sized,
{
    root.set_attribute(THEME_ATTRIBUTE, DARK_VALUE);
    root.remove_class(LIGHT_CLASS);
    root.add_class(DARK_CLASS);
    best_effort(|| storage.set_item(STORAGE_KEY, DARK_VALUE));
}

/// In-memory root element: attributes plus an ordered class list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentRoot {
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
}

impl DocumentRoot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_classes<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut root = Self::new();
        for class in classes {
            root.add_class(class.as_ref());
        }
        root
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

impl RootElement for DocumentRoot {
    fn set_attribute(&mut self, name: &str, value: &str) {
        self.attributes.insert(name.to_string(), value.to_string());
    }

    fn remove_class(&mut self, class: &str) {
        self.classes.retain(|c| c != class);
    }

    fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_item(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }
}

impl PersistentStorage for MemoryStorage {
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Storage that refuses every write, as in a browser with storage disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledStorage;

impl PersistentStorage for DisabledStorage {
    fn set_item(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }
}

/// Browser script doing what [`force_dark`] does, against the live DOM
pub fn theme_script() -> String {
    let mut js = String::new();
    js.push_str("/* Force the dark theme on page load, before first paint.\n");
    js.push_str("   Sets the theme attribute, marker classes and stored preference\n");
    js.push_str("   that the theme switcher reads. */\n");
    js.push_str("(function(){\n");
    js.push_str("  try {\n");
    js.push_str(&format!(
        "    document.documentElement.setAttribute('{}','{}');\n",
        THEME_ATTRIBUTE, DARK_VALUE
    ));
    js.push_str(&format!(
        "    document.documentElement.classList.remove('{}');\n",
        LIGHT_CLASS
    ));
    js.push_str(&format!(
        "    document.documentElement.classList.add('{}');\n",
        DARK_CLASS
    ));
    js.push_str(&format!(
        "    try {{ localStorage.setItem('{}','{}'); }} catch(_) {{}}\n",
        STORAGE_KEY, DARK_VALUE
    ));
    js.push_str("  } catch (e) {\n");
    js.push_str("    // silent\n");
    js.push_str("  }\n");
    js.push_str("})();\n");
    js
}

/// Outcome of adding the theme script to a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Injection {
    /// The page with the script tag added
    Inserted(String),
    AlreadyPresent,
    /// The page has no `<head>` to put a blocking script in
    NoHead,
}

/// Add a blocking `<script src=...>` as the first child of `<head>`
///
/// The tag carries neither `async` nor `defer` so the browser runs it
/// during parsing. Pages that already reference `src` are left alone.
pub fn inject_script_tag(html: &str, src: &str) -> Injection {
    // Compare against the attribute as written, not the raw path
    let attr = src.replace('&', "&amp;").replace('"', "&quot;");
    let existing = Regex::new(&format!(
        r#"(?i)<script[^>]*\bsrc\s*=\s*["']{}["']"#,
        regex::escape(&attr)
    ));
    if existing.map(|re| re.is_match(html)).unwrap_or(false) {
        return Injection::AlreadyPresent;
    }

    let Some(head) = HEAD_OPEN_RE.find(html) else {
        return Injection::NoHead;
    };

    let mut page = String::with_capacity(html.len() + attr.len() + 32);
    page.push_str(&html[..head.end()]);
    page.push_str(&format!("\n<script src=\"{}\"></script>", attr));
    page.push_str(&html[head.end()..]);
    Injection::Inserted(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Storage that counts attempts and fails every one
    #[derive(Default)]
    struct FlakyStorage {
        attempts: usize,
    }

    impl PersistentStorage for FlakyStorage {
        fn set_item(&mut self, key: &str, _value: &str) -> Result<(), StorageError> {
            self.attempts += 1;
            Err(StorageError::Denied(format!("write to '{}' blocked", key)))
        }
    }

    fn assert_dark(root: &DocumentRoot) {
        assert_eq!(root.attribute(THEME_ATTRIBUTE), Some(DARK_VALUE));
        assert!(root.has_class(DARK_CLASS));
        assert!(!root.has_class(LIGHT_CLASS));
    }

    #[test]
    fn test_force_dark_sets_attribute_classes_and_storage() {
        let mut root = DocumentRoot::with_classes(["light-mode", "pretext"]);
        let mut storage = MemoryStorage::new();

        force_dark(&mut root, &mut storage);

        assert_dark(&root);
        assert!(root.has_class("pretext"));
        assert_eq!(storage.get_item(STORAGE_KEY), Some("dark"));
    }

    #[test]
    fn test_prior_light_preference_is_overridden() {
        let mut root = DocumentRoot::new();
        root.set_attribute(THEME_ATTRIBUTE, "light");
        let mut storage = MemoryStorage::new();
        storage.set_item(STORAGE_KEY, "light").unwrap();

        force_dark(&mut root, &mut storage);

        assert_dark(&root);
        assert_eq!(storage.get_item(STORAGE_KEY), Some("dark"));
    }

    #[test]
    fn test_storage_failure_is_swallowed() {
        let mut root = DocumentRoot::with_classes(["light-mode"]);
        force_dark(&mut root, &mut DisabledStorage);
        assert_dark(&root);

        let mut flaky = FlakyStorage::default();
        let mut root = DocumentRoot::new();
        force_dark(&mut root, &mut flaky);
        assert_dark(&root);
        // No retries
        assert_eq!(flaky.attempts, 1);
    }

    #[test]
    fn test_repeated_runs_do_not_duplicate_classes() {
        let mut root = DocumentRoot::new();
        let mut storage = MemoryStorage::new();
        force_dark(&mut root, &mut storage);
        force_dark(&mut root, &mut storage);
        assert_eq!(root.classes(), &["dark-mode".to_string()]);
    }

    #[test]
    fn test_script_uses_contract_names() {
        let js = theme_script();
        assert!(js.contains("setAttribute('data-theme','dark')"));
        assert!(js.contains("classList.remove('light-mode')"));
        assert!(js.contains("classList.add('dark-mode')"));
        assert!(js.contains("try { localStorage.setItem('theme','dark'); } catch(_) {}"));
        assert!(js.ends_with("})();\n"));
    }

    #[test]
    fn test_script_snapshot() {
        insta::assert_snapshot!(theme_script(), @r"
        /* Force the dark theme on page load, before first paint.
           Sets the theme attribute, marker classes and stored preference
           that the theme switcher reads. */
        (function(){
          try {
            document.documentElement.setAttribute('data-theme','dark');
            document.documentElement.classList.remove('light-mode');
            document.documentElement.classList.add('dark-mode');
            try { localStorage.setItem('theme','dark'); } catch(_) {}
          } catch (e) {
            // silent
          }
        })();
        ");
    }

    #[test]
    fn test_inject_places_script_first_in_head() {
        let html = "<!DOCTYPE html>\n<html>\n<HEAD lang=\"en\">\n<title>T</title>\n</HEAD>\n</html>";
        let Injection::Inserted(page) = inject_script_tag(html, "force-dark.js") else {
            panic!("expected insertion");
        };
        assert!(page.contains("<HEAD lang=\"en\">\n<script src=\"force-dark.js\"></script>\n<title>"));
        assert_eq!(inject_script_tag(&page, "force-dark.js"), Injection::AlreadyPresent);
    }

    #[test]
    fn test_inject_escaped_src_is_idempotent() {
        let html = "<html><head></head><body></body></html>";
        let Injection::Inserted(page) = inject_script_tag(html, "theme.js?v=1&dark") else {
            panic!("expected insertion");
        };
        assert!(page.contains("<script src=\"theme.js?v=1&amp;dark\"></script>"));
        assert_eq!(
            inject_script_tag(&page, "theme.js?v=1&dark"),
            Injection::AlreadyPresent
        );
    }

    #[test]
    fn test_inject_without_head() {
        assert_eq!(
            inject_script_tag("<p>fragment</p>", "force-dark.js"),
            Injection::NoHead
        );
    }

    #[test]
    fn test_header_element_is_not_head() {
        let html = "<html><body><header>x</header></body></html>";
        assert_eq!(inject_script_tag(html, "force-dark.js"), Injection::NoHead);
    }
}
