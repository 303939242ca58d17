use crate::Record;

/// Label used when neither the caller nor the config names a program/platform.
pub const DEFAULT_LABEL: &str = "default";

/// Program/platform labels applied to every record of one ingestion run.
///
/// Fields hold the explicit labels (e.g. from `--program`); `None` means the
/// record's own value, then the configured default, then [`DEFAULT_LABEL`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Provenance {
    pub program: Option<String>,
    pub platform: Option<String>,
    pub default_program: Option<String>,
    pub default_platform: Option<String>,
}

impl Provenance {
    pub fn new(program: Option<String>, platform: Option<String>) -> Self {
        Provenance { program, platform, ..Default::default() }
    }

    pub fn with_defaults(mut self, program: Option<String>, platform: Option<String>) -> Self {
        self.default_program = program;
        self.default_platform = platform;
        self
    }

    pub fn apply(&self, record: &mut Record) {
        record.program = pick(&self.program, &record.program, &self.default_program);
        record.platform = pick(&self.platform, &record.platform, &self.default_platform);
    }
}

fn pick(explicit: &Option<String>, own: &str, configured: &Option<String>) -> String {
    [explicit.as_deref(), Some(own), configured.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(DEFAULT_LABEL)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_label_wins() {
        let p = Provenance::new(Some("acme".into()), None)
            .with_defaults(Some("cfg".into()), Some("h1".into()));
        let mut r = Record { program: "own".into(), ..Default::default() };
        p.apply(&mut r);
        assert_eq!(r.program, "acme");
        assert_eq!(r.platform, "h1");
    }

    #[test]
    fn record_label_beats_configured_default() {
        let p = Provenance::default().with_defaults(Some("cfg".into()), None);
        let mut r = Record { program: "own".into(), ..Default::default() };
        p.apply(&mut r);
        assert_eq!(r.program, "own");
    }

    #[test]
    fn never_empty() {
        let p = Provenance::new(Some(String::new()), None).with_defaults(Some("  ".into()), None);
        let mut r = Record::default();
        p.apply(&mut r);
        assert_eq!(r.program, DEFAULT_LABEL);
        assert_eq!(r.platform, DEFAULT_LABEL);
    }
}
