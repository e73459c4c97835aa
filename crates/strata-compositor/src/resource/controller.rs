use super::{ResourceProvider, TextureUploadQueue};

/// What a drained queue amounted to.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub applied: usize,
    pub rejected: usize,
    pub bytes: usize,
}

/// Applies every queued upload to `provider`, leaving `queue` empty.
///
/// A rejected entry is logged and skipped; it never stops the drain, so
/// nothing queued for this commit can leak into the next one.
pub fn update_textures<P>(provider: &mut P, queue: &mut TextureUploadQueue) -> UploadSummary
where
    P: ResourceProvider + ?Sized,
{
    let mut summary = UploadSummary::default();
    if queue.is_empty() {
        return summary;
    }

    provider.begin_uploads();
    for upload in queue.drain() {
        let target = upload.target();
        let bytes = upload.byte_size();
        match provider.apply_upload(upload) {
            Ok(()) => {
                summary.applied += 1;
                summary.bytes += bytes;
            }
            Err(err) => {
                summary.rejected += 1;
                log::warn!("dropping upload to {target:?}: {err}");
            }
        }
    }
    provider.end_uploads();

    log::trace!(
        "uploaded {} textures ({} bytes, {} rejected)",
        summary.applied,
        summary.bytes,
        summary.rejected
    );
    summary
}
