/// Progress of one analysis save, logged as the `stage` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStage {
    Received,
    Enriching,
    Merged,
    Persisted,
    Dispatching,
    Responded,
}

impl AnalysisStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Enriching => "enriching",
            Self::Merged => "merged",
            Self::Persisted => "persisted",
            Self::Dispatching => "dispatching",
            Self::Responded => "responded",
        }
    }
}

impl std::fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
