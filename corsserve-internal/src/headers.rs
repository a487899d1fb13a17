use unicase::Ascii;

/// Header map with case-insensitive names that keeps insertion order,
/// so responses are written in the order their headers were set.
#[derive(Default, Debug, Clone)]
pub struct HeaderMap {
    inner: Vec<(Ascii<String>, String)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self { inner: Vec::new() }
    }

    pub fn get(&self, key: impl ToString) -> Option<&str> {
        let key = Ascii::new(key.to_string());
        self.inner
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Replaces the value in place if the name is already present.
    pub fn set(&mut self, key: impl ToString, val: impl ToString) {
        let key = Ascii::new(key.to_string());
        match self.inner.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = val.to_string(),
            None => self.inner.push((key, val.to_string())),
        }
    }

    pub fn contains(&self, key: impl ToString) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: ToString, V: ToString> FromIterator<(K, V)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = HeaderMap::new();
        for (k, v) in iter {
            map.set(k, v);
        }
        map
    }
}
