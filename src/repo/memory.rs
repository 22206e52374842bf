use std::collections::HashMap;

use anyhow::Result;

use super::KeyValueStore;

#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: HashMap<String, String>,
}

impl InMemoryStore {
    pub fn with_seed<K, V>(seed: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut store = Self::default();
        store
            .entries
            .extend(seed.into_iter().map(|(k, v)| (k.into(), v.into())));
        store
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_overwrites_previous_value() {
        let mut store = InMemoryStore::with_seed([("darkMode", "false")]);
        assert_eq!(store.get("darkMode").unwrap().as_deref(), Some("false"));

        store.set("darkMode", "true").unwrap();
        assert_eq!(store.get("darkMode").unwrap().as_deref(), Some("true"));
        assert_eq!(store.get("tasks").unwrap(), None);
    }
}
