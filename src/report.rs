//! Diagnostics describing how far a check got, in the shape consumed by
//! the timeline renderer.
//!
//! The verbose check entry points return a [`LinearizationInfo`]: one
//! record per partition holding the operations, the deepest partial
//! linearizations the search reached, and for each operation the longest
//! partial linearization containing it. Callers may layer extra context on
//! top with [`LinearizationInfo::add_annotations`] (fault injections,
//! leader changes, and the like), then hand the whole structure to
//! [`visualize`]. Field names serialize in the renderer's wire casing.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::io::{self, Write};

/// One operation row on a partition's timeline.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct HistoryElement {
    #[serde(rename = "ClientId")]
    pub client_id: usize,
    #[serde(rename = "Start")]
    pub start: i64,
    #[serde(rename = "End")]
    pub end: i64,
    #[serde(rename = "Description")]
    pub description: String,
}

/// One linearized operation within a partial linearization, paired with a
/// rendering of the model state reached after applying it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct LinearizationStep {
    /// Index of the operation in the partition's history.
    #[serde(rename = "Index")]
    pub index: usize,
    #[serde(rename = "StateDescription")]
    pub state_description: String,
}

/// Diagnostics for one partition.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct PartitionDiagnostics {
    /// Operations in (start, end, id) order.
    #[serde(rename = "History")]
    pub history: Vec<HistoryElement>,
    /// Maximal partial linearizations, in the order the search found them.
    #[serde(rename = "PartialLinearizations")]
    pub partial_linearizations: Vec<Vec<LinearizationStep>>,
    /// Maps each operation index to the longest entry of
    /// `partial_linearizations` containing it.
    #[serde(rename = "Largest")]
    pub largest: BTreeMap<usize, usize>,
}

/// Where an annotation is anchored on the timeline.
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum AnnotationTarget {
    /// An existing client row.
    Client(usize),
    /// A named row of its own, e.g. `"Server 1"`.
    Tag(String),
}

/// Extra context layered onto a visualization, such as a fault injection
/// or a leader change observed while the history was recorded.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Annotation {
    pub target: AnnotationTarget,
    /// When the annotated condition began.
    pub start: i64,
    /// When it ended; `None` marks a single point in time.
    pub end: Option<i64>,
    pub description: String,
    pub details: Option<String>,
    /// CSS color for the annotation's box.
    pub background_color: Option<String>,
    /// CSS color for the annotation's label.
    pub text_color: Option<String>,
}

impl Serialize for Annotation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (client_id, tag) = match &self.target {
            AnnotationTarget::Client(id) => (*id, ""),
            AnnotationTarget::Tag(tag) => (0, tag.as_str()),
        };
        let mut out = serializer.serialize_struct("Annotation", 9)?;
        out.serialize_field("ClientId", &client_id)?;
        out.serialize_field("Tag", tag)?;
        out.serialize_field("Start", &self.start)?;
        out.serialize_field("End", &self.end.unwrap_or(self.start))?;
        out.serialize_field("Description", &self.description)?;
        out.serialize_field("Details", self.details.as_deref().unwrap_or(""))?;
        out.serialize_field(
            "BackgroundColor",
            self.background_color.as_deref().unwrap_or(""),
        )?;
        out.serialize_field("TextColor", self.text_color.as_deref().unwrap_or(""))?;
        // distinguishes annotation rows from history rows in the renderer
        out.serialize_field("Annotation", &true)?;
        out.end()
    }
}

/// Diagnostics for a full check: per-partition records in the model's
/// partition order, plus any annotations supplied by the caller.
#[derive(Clone, Debug, Default, Serialize)]
pub struct LinearizationInfo {
    #[serde(rename = "Partitions")]
    partitions: Vec<PartitionDiagnostics>,
    #[serde(rename = "Annotations")]
    annotations: Vec<Annotation>,
    #[serde(rename = "Clients")]
    clients: Vec<usize>,
}

impl LinearizationInfo {
    pub(crate) fn new(partitions: Vec<PartitionDiagnostics>) -> Self {
        let mut clients: Vec<usize> = partitions
            .iter()
            .flat_map(|partition| partition.history.iter().map(|element| element.client_id))
            .collect();
        clients.sort_unstable();
        clients.dedup();
        LinearizationInfo {
            partitions,
            annotations: Vec::new(),
            clients,
        }
    }

    /// Per-partition diagnostics, in the model's partition order.
    pub fn partitions(&self) -> &[PartitionDiagnostics] {
        &self.partitions
    }

    /// Annotations merged so far, sorted by (target, start, end).
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Client ids appearing anywhere in the history, ascending.
    pub fn clients(&self) -> &[usize] {
        &self.clients
    }

    /// Merges a batch of annotations and restores the sort order.
    pub fn add_annotations(&mut self, batch: Vec<Annotation>) {
        self.annotations.extend(batch);
        self.annotations.sort_by(|a, b| {
            (&a.target, a.start, a.end.unwrap_or(a.start)).cmp(&(
                &b.target,
                b.start,
                b.end.unwrap_or(b.start),
            ))
        });
    }
}

/// Writes an HTML page visualizing `info` to `sink`.
///
/// The page embeds the diagnostics as JSON and defers the drawing to the
/// timeline renderer script, loaded as `index.js` from the directory the
/// generated file is opened from. The renderer expects the `jump-link`,
/// `canvas`, and `calc` elements to exist: it scrolls via the first,
/// draws into the second, and measures text inside the (hidden) third.
pub fn visualize<W: Write>(info: &LinearizationInfo, sink: &mut W) -> io::Result<()> {
    let data = serde_json::to_string(info)?;
    writeln!(sink, "<!DOCTYPE html>")?;
    writeln!(sink, "<html>")?;
    writeln!(
        sink,
        "<head><meta charset=\"utf-8\"><title>linearizability check</title></head>"
    )?;
    writeln!(sink, "<body>")?;
    writeln!(
        sink,
        "<div id=\"jump-link\" class=\"inactive\">jump to first error</div>"
    )?;
    writeln!(sink, "<div id=\"canvas\"></div>")?;
    writeln!(sink, "<div id=\"calc\" style=\"display: none\"></div>")?;
    writeln!(sink, "<script>const data = {}</script>", data)?;
    writeln!(sink, "<script src=\"index.js\"></script>")?;
    writeln!(sink, "<script>render(data)</script>")?;
    writeln!(sink, "</body>")?;
    writeln!(sink, "</html>")
}
