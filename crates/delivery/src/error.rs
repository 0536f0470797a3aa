use markup::SkeletonError;

/// Fatal delivery failures. Everything else (a collaborator failing on one
/// placeholder) degrades in place and never reaches this type.
#[derive(Debug)]
pub enum DeliveryError {
    /// The upstream renderer handed over markup this engine cannot frame.
    /// Raised before the first byte is written, so the caller can still send
    /// an ordinary error response.
    MalformedSkeleton(SkeletonError),
    /// The transport refused a write or flush, typically a disconnect. The
    /// pipeline aborts; there is no client left to observe further output.
    StreamWrite(std::io::Error),
    /// A replacement payload failed to serialize. Does not occur for payloads
    /// built from valid JSON settings.
    ReplacementEncode(serde_json::Error),
}

impl std::fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryError::MalformedSkeleton(e) => write!(f, "malformed skeleton: {e}"),
            DeliveryError::StreamWrite(e) => write!(f, "stream write failed: {e}"),
            DeliveryError::ReplacementEncode(e) => {
                write!(f, "replacement payload failed to encode: {e}")
            }
        }
    }
}

impl std::error::Error for DeliveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DeliveryError::MalformedSkeleton(e) => Some(e),
            DeliveryError::StreamWrite(e) => Some(e),
            DeliveryError::ReplacementEncode(e) => Some(e),
        }
    }
}

impl From<SkeletonError> for DeliveryError {
    fn from(e: SkeletonError) -> Self {
        DeliveryError::MalformedSkeleton(e)
    }
}

impl From<std::io::Error> for DeliveryError {
    fn from(e: std::io::Error) -> Self {
        DeliveryError::StreamWrite(e)
    }
}

impl From<serde_json::Error> for DeliveryError {
    fn from(e: serde_json::Error) -> Self {
        DeliveryError::ReplacementEncode(e)
    }
}
