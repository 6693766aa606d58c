pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The native side reported failure for a commit batch.
    /// The engine treats the diff as unapplied and remounts the
    /// affected subtree on the next pass.
    #[error("native runtime rejected a commit batch")]
    BridgeRejected,

    /// An op stream failed referential-integrity validation.
    /// Indicates an engine bug, not a user error.
    #[error("commit validation failed: {0}")]
    CommitValidation(String),

    #[error(transparent)]
    Vdom(#[from] dcf_vdom::Error),

    #[error(transparent)]
    Bridge(#[from] dcf_bridge::Error),
}
