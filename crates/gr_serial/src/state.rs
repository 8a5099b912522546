use core::fmt;

/// Progress of a save or load session, observable for diagnostics.
///
/// Saving walks `Idle → Discovering → WritingSchema → WritingHeaders →
/// WritingData → Done`. Loading walks `Idle → ReadingSchema → ReadingHeaders →
/// Ready`, then alternates between `Hydrating` and `Ready` until every object
/// of the stream is hydrated, which is `Done`. Objects that nothing loaded
/// refers to, such as the targets of skipped members, keep a load session in
/// `Ready`.
///
/// A session that fails stays in the state it failed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
    #[default]
    Idle,
    Discovering,
    WritingSchema,
    WritingHeaders,
    WritingData,
    ReadingSchema,
    ReadingHeaders,
    Ready,
    Hydrating,
    Done,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
