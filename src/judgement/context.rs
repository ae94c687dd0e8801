/// The variable context: an ordered list of (variable, type-text) bindings.
///
/// Lookup scans from the most recent entry backward, so a later binding for
/// the same name shadows an earlier one. Bindings are never removed: a
/// binding pushed while checking a lambda body stays for the rest of the
/// run, and the context survives across input lines.
#[derive(Debug, Default)]
pub struct Context {
    entries: Vec<(String, String)>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, name: impl Into<String>, type_text: impl Into<String>) {
        self.entries.push((name.into(), type_text.into()));
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(bound, _)| bound == name)
            .map(|(_, type_text)| type_text.as_str())
    }
}
