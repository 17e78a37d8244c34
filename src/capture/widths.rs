use crate::options::SnapshotOptions;
use crate::sidecar::EligibleWidths;

/// Widths to capture for a responsive snapshot.
///
/// Mobile widths come first and are always included. They are followed by the
/// caller's `width`, else the caller's `widths`, else the configured widths.
/// Each width appears once.
pub fn widths_for_multi_dom(eligible: &EligibleWidths, options: &SnapshotOptions) -> Vec<u32> {
    let single = options.width.filter(|width| *width > 0);
    let requested: &[u32] = match single.as_ref() {
        Some(width) => std::slice::from_ref(width),
        None if !options.widths.is_empty() => &options.widths,
        None => &eligible.config,
    };

    let mut widths = Vec::with_capacity(eligible.mobile.len() + requested.len());
    for width in eligible.mobile.iter().chain(requested) {
        if *width > 0 && !widths.contains(width) {
            widths.push(*width);
        }
    }
    widths
}
