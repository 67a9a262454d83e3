use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use unicode_properties::{GeneralCategoryGroup, UnicodeGeneralCategory};

/// Returned by [`FactStore::recall`] for keys that were never learned.
pub const NOT_REMEMBERED: &str = "I don't remember that yet.";

const FACT_SUFFIX: &str = ".txt";

/// Key → value mapping. Iterates in insertion order: loaded files first (in
/// directory order), then newly learned keys. Overwriting keeps a key's slot.
pub type Facts = IndexMap<String, String>;

/// Replace every character that is not a letter, a number, `-`, `_` or `.`
/// with `_`. Combining marks (e.g. Devanagari vowel signs) are not letters.
///
/// Known limitation: this is not invertible. Keys that differ only in
/// replaced characters ("a/b", "a:b", "a b") share one file and overwrite
/// each other on disk, and reloading turns every `_` back into a space.
pub fn sanitize_filename(key: &str) -> String {
    key.chars()
        .map(|c| {
            let keep = matches!(
                c.general_category_group(),
                GeneralCategoryGroup::Letter | GeneralCategoryGroup::Number
            ) || matches!(c, '-' | '_' | '.');
            if keep {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Facts held in memory and mirrored to one text file per key.
///
/// The in-memory map is authoritative once loaded; files are only read back
/// by [`FactStore::load`].
#[derive(Debug)]
pub struct FactStore {
    folder: PathBuf,
    facts: Facts,
}

impl FactStore {
    /// Open the store at `folder`, creating it if missing, and load every
    /// fact file it contains.
    pub fn open(folder: &Path) -> Result<Self> {
        std::fs::create_dir_all(folder)
            .with_context(|| format!("failed to create fact folder '{}'", folder.display()))?;
        let mut store = Self {
            folder: folder.to_path_buf(),
            facts: Facts::new(),
        };
        store.load()?;
        Ok(store)
    }

    /// Read all `*.txt` files in the folder into memory, merging over
    /// whatever is already loaded.
    pub fn load(&mut self) -> Result<()> {
        let entries = std::fs::read_dir(&self.folder)
            .with_context(|| format!("failed to list fact folder '{}'", self.folder.display()))?;

        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    tracing::warn!("Skipping non UTF-8 file name in fact folder: {raw:?}");
                    continue;
                }
            };
            let Some(stem) = name.strip_suffix(FACT_SUFFIX) else {
                continue;
            };
            if !path.is_file() {
                tracing::debug!("Skipping non-file entry {}", path.display());
                continue;
            }

            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read fact file '{}'", path.display()))?;
            self.facts
                .insert(stem.replace('_', " "), content.trim().to_string());
        }

        tracing::debug!(
            "Loaded {} fact(s) from {}",
            self.facts.len(),
            self.folder.display()
        );
        Ok(())
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// File a key is persisted to.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.folder
            .join(format!("{}{FACT_SUFFIX}", sanitize_filename(key)))
    }

    /// Store `value` under `key`, overwriting any previous value, and write
    /// it through to disk before returning.
    pub fn learn(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        std::fs::write(&path, value)
            .with_context(|| format!("failed to write fact file '{}'", path.display()))?;
        tracing::debug!("Stored '{key}' in {}", path.display());
        self.facts.insert(key.to_string(), value.to_string());
        Ok(())
    }

    pub fn recall(&self, key: &str) -> &str {
        self.facts
            .get(key)
            .map(String::as_str)
            .unwrap_or(NOT_REMEMBERED)
    }

    /// Overwrite an existing fact. Returns false (and writes nothing) if the
    /// key was never learned.
    pub fn update(&mut self, key: &str, value: &str) -> Result<bool> {
        if !self.contains(key) {
            return Ok(false);
        }
        self.learn(key, value)?;
        Ok(true)
    }

    /// Snapshot of every fact. Changes to the returned map do not reach the
    /// store.
    pub fn all_facts(&self) -> Facts {
        self.facts.clone()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.facts.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_keeps_allowed_chars() {
        assert_eq!(sanitize_filename("my-key_v1.2"), "my-key_v1.2");
        assert_eq!(sanitize_filename("favorite color"), "favorite_color");
        assert_eq!(sanitize_filename("a/b:c?"), "a_b_c_");
        assert_eq!(sanitize_filename("café"), "café");
        assert_eq!(sanitize_filename(""), "");
    }

    #[test]
    fn test_open_creates_folder() {
        let dir = TempDir::new().unwrap();
        let folder = dir.path().join("knowledge");
        assert!(!folder.exists());

        let store = FactStore::open(&folder).unwrap();
        assert!(folder.is_dir());
        assert!(store.is_empty());
        assert_eq!(store.folder(), folder.as_path());
    }

    #[test]
    fn test_learn_then_recall() {
        let dir = TempDir::new().unwrap();
        let mut store = FactStore::open(dir.path()).unwrap();

        store.learn("favorite color", "blue").unwrap();
        assert_eq!(store.recall("favorite color"), "blue");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_recall_unknown_returns_sentinel() {
        let dir = TempDir::new().unwrap();
        let store = FactStore::open(dir.path()).unwrap();
        assert_eq!(store.recall("anything"), NOT_REMEMBERED);
    }

    #[test]
    fn test_learn_writes_file_immediately() {
        let dir = TempDir::new().unwrap();
        let mut store = FactStore::open(dir.path()).unwrap();

        store.learn("favorite color", "blue").unwrap();
        let path = dir.path().join("favorite_color.txt");
        assert_eq!(store.path_for("favorite color"), path);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "blue");

        store.learn("favorite color", "green").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "green");
    }

    #[test]
    fn test_update_unknown_key_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut store = FactStore::open(dir.path()).unwrap();

        assert!(!store.update("ghost", "boo").unwrap());
        assert!(store.is_empty());
        assert_eq!(store.recall("ghost"), NOT_REMEMBERED);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_update_known_key() {
        let dir = TempDir::new().unwrap();
        let mut store = FactStore::open(dir.path()).unwrap();

        store.learn("pet", "cat").unwrap();
        assert!(store.update("pet", "dog").unwrap());
        assert_eq!(store.recall("pet"), "dog");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("pet.txt")).unwrap(),
            "dog"
        );
    }

    #[test]
    fn test_all_facts_is_a_copy() {
        let dir = TempDir::new().unwrap();
        let mut store = FactStore::open(dir.path()).unwrap();
        store.learn("city", "Oslo").unwrap();

        let mut snapshot = store.all_facts();
        snapshot.insert("city".into(), "Bergen".into());
        snapshot.insert("extra".into(), "x".into());

        assert_eq!(store.recall("city"), "Oslo");
        assert!(!store.contains("extra"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_reopen_restores_facts() {
        let dir = TempDir::new().unwrap();
        {
            let mut store = FactStore::open(dir.path()).unwrap();
            store.learn("favorite color", "blue").unwrap();
            store.learn("pet", "cat").unwrap();
        }

        let store = FactStore::open(dir.path()).unwrap();
        let facts = store.all_facts();
        assert_eq!(facts.len(), 2);
        assert_eq!(facts["favorite color"], "blue");
        assert_eq!(facts["pet"], "cat");
    }

    #[test]
    fn test_load_trims_values_and_ignores_other_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("motto.txt"), "  carpe diem \n").unwrap();
        std::fs::write(dir.path().join("notes.md"), "not a fact").unwrap();
        std::fs::create_dir(dir.path().join("nested.txt")).unwrap();

        let store = FactStore::open(dir.path()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.recall("motto"), "carpe diem");
    }

    #[test]
    fn test_load_maps_underscores_to_spaces() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("snake_case_key.txt"), "v").unwrap();

        let store = FactStore::open(dir.path()).unwrap();
        assert_eq!(store.recall("snake case key"), "v");
        assert_eq!(store.recall("snake_case_key"), NOT_REMEMBERED);
    }

    #[test]
    fn test_colliding_keys_share_one_file() {
        let dir = TempDir::new().unwrap();
        let mut store = FactStore::open(dir.path()).unwrap();

        store.learn("a/b", "first").unwrap();
        store.learn("a:b", "second").unwrap();
        // Both live in memory until restart...
        assert_eq!(store.recall("a/b"), "first");
        assert_eq!(store.recall("a:b"), "second");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("a_b.txt")).unwrap(),
            "second"
        );

        // ...but only the last write survives, under a rewritten key.
        let reopened = FactStore::open(dir.path()).unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.recall("a b"), "second");
        assert_eq!(reopened.recall("a/b"), NOT_REMEMBERED);
    }

    #[test]
    fn test_unicode_value_roundtrip() {
        let dir = TempDir::new().unwrap();
        let text = "Rust 🦀 и Python 🐍";
        {
            let mut store = FactStore::open(dir.path()).unwrap();
            store.learn("langs", text).unwrap();
        }
        let store = FactStore::open(dir.path()).unwrap();
        assert_eq!(store.recall("langs"), text);
    }

    #[test]
    fn test_sanitize_replaces_combining_marks() {
        assert_eq!(sanitize_filename("हिंदी"), "ह__द_");
        assert_eq!(sanitize_filename("naïve"), "naïve");
        assert_eq!(sanitize_filename("a\u{301}"), "a_");
        assert_eq!(sanitize_filename("Ⅻ½٣"), "Ⅻ½٣");
    }

    #[test]
    fn test_all_facts_keeps_insertion_order() {
        let dir = TempDir::new().unwrap();
        let mut store = FactStore::open(dir.path()).unwrap();

        store.learn("zebra", "1").unwrap();
        store.learn("apple", "2").unwrap();
        store.learn("mango", "3").unwrap();
        store.learn("zebra", "4").unwrap();

        let keys: Vec<_> = store.all_facts().into_iter().collect();
        assert_eq!(
            keys,
            vec![
                ("zebra".to_string(), "4".to_string()),
                ("apple".to_string(), "2".to_string()),
                ("mango".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn test_write_failure_propagates() {
        let dir = TempDir::new().unwrap();
        let mut store = FactStore::open(dir.path()).unwrap();
        // A directory where the fact file should go can't be written, even by root.
        std::fs::create_dir(dir.path().join("k.txt")).unwrap();

        let err = store.learn("k", "v").unwrap_err();
        assert!(err.to_string().contains("failed to write fact file"));
        assert!(!store.contains("k"));
    }
}
