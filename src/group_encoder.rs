use crate::Result;
use crate::sentence_parser::SentenceGroup;

/// Sink for completed sentence groups.
///
/// Callers own the lifecycle: `close` must be called once all groups are written.
pub trait GroupEncoder {
    fn write_group(&mut self, group: &SentenceGroup) -> Result<()>;
    fn close(&mut self) -> Result<()>;
}
