/// Opaque handle to a created group, produced by the executor boundary.
///
/// The scheduler never interprets `id`; it only threads the handle back into
/// subsequent executor calls for the same batch.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DestinationHandle {
    pub id: String,
    pub label: String,
}

impl DestinationHandle {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}
