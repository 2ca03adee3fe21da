use log::debug;

use super::count_histogram::MAX_BARS;
use super::{IpTree, RenderedCounts};
use crate::render::surface::{Bounds, Surface};

/// Top addresses of one [`IpTree`], computed at render time.
///
/// Which end of the flow is shown is decided by the tree handed to
/// [`AddressHistogram::render_from_tree`].
#[derive(Debug, Clone)]
pub struct AddressHistogram {
    pub title: String,
}

impl AddressHistogram {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    pub fn render_from_tree(
        &self,
        surface: &mut dyn Surface,
        bounds: Bounds,
        tree: &IpTree,
    ) -> RenderedCounts {
        let counts = tree.aggregate(MAX_BARS);
        debug!(
            "{}: {} distinct addresses in {} groups",
            self.title,
            tree.len(),
            counts.len()
        );
        let height = counts.render(surface, bounds, &self.title);

        RenderedCounts {
            height,
            top_list: counts.top_list(MAX_BARS),
            count_sum: counts.count_sum(),
        }
    }
}
