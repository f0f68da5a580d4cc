use std::fmt;

/// Structured logging context handed to each component at construction.
///
/// Carries a `log` target plus ordered key/value fields that are rendered in
/// front of every message, e.g. `owner=acme repo=api run_id=42 logs expired`.
#[derive(Debug, Clone)]
pub struct LogScope {
    target: &'static str,
    fields: Vec<(&'static str, String)>,
}

impl LogScope {
    pub fn new(target: &'static str) -> Self {
        Self {
            target,
            fields: Vec::new(),
        }
    }

    /// Derive a child scope with one more field. Re-using a key replaces it.
    #[must_use]
    pub fn with(&self, key: &'static str, value: impl fmt::Display) -> Self {
        let mut fields = self.fields.clone();
        let value = value.to_string();
        match fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => fields.push((key, value)),
        }
        Self {
            target: self.target,
            fields,
        }
    }

    /// Same fields, different component target.
    #[must_use]
    pub fn for_target(&self, target: &'static str) -> Self {
        Self {
            target,
            fields: self.fields.clone(),
        }
    }

    pub fn target(&self) -> &'static str {
        self.target
    }

    #[cfg(test)]
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for LogScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}
