//! Private module for selective re-export.

use crate::history::Operation;

/// Payload of a pending entry.
pub(crate) enum EntryKind<In, Out> {
    /// An invocation, cross-linked to the arena index of its response.
    Call { input: In, matching: usize },
    /// A response.
    Return { output: Out },
}

/// One call or return event awaiting linearization.
pub(crate) struct Entry<In, Out> {
    pub kind: EntryKind<In, Out>,
    /// Operation the entry belongs to, dense within the partition.
    pub id: usize,
}

/// A doubly-linked list over a pre-sized arena of entries.
///
/// Links are arena indices rather than pointers, so entry identity is
/// stable across lifts. A lifted entry keeps its own `prev`/`next` links;
/// as long as lifts and unlifts nest last-in-first-out, relinking through
/// those saved indices restores the exact list.
pub(crate) struct EntryList<In, Out> {
    entries: Vec<Entry<In, Out>>,
    prev: Vec<usize>,
    next: Vec<usize>,
}

impl<In, Out> EntryList<In, Out> {
    fn new(entries: Vec<Entry<In, Out>>) -> Self {
        let n = entries.len();
        // circular through the sentinel at index n
        let mut prev = Vec::with_capacity(n + 1);
        let mut next = Vec::with_capacity(n + 1);
        for index in 0..=n {
            prev.push(if index == 0 { n } else { index - 1 });
            next.push(if index == n { 0 } else { index + 1 });
        }
        EntryList { entries, prev, next }
    }

    fn sentinel(&self) -> usize {
        self.entries.len()
    }

    /// First pending entry, if any.
    pub fn first(&self) -> Option<usize> {
        let head = self.next[self.sentinel()];
        (head != self.sentinel()).then_some(head)
    }

    /// Pending entry after `index`, if any.
    pub fn next_of(&self, index: usize) -> Option<usize> {
        let next = self.next[index];
        (next != self.sentinel()).then_some(next)
    }

    pub fn entry(&self, index: usize) -> &Entry<In, Out> {
        &self.entries[index]
    }

    /// For a call entry, its input and the matching return's output.
    pub fn call_io(&self, index: usize) -> Option<(&In, &Out)> {
        match &self.entries[index].kind {
            EntryKind::Call { input, matching } => match &self.entries[*matching].kind {
                EntryKind::Return { output } => Some((input, output)),
                EntryKind::Call { .. } => unreachable!("matching entry must be a return"),
            },
            EntryKind::Return { .. } => None,
        }
    }

    /// Detaches a call entry and its matching return in O(1).
    pub fn lift(&mut self, call: usize) {
        let matching = self.matching(call);
        self.unlink(call);
        self.unlink(matching);
    }

    /// Reattaches a call entry and its matching return at their original
    /// positions. Lifts must be unwound in reverse order.
    pub fn unlift(&mut self, call: usize) {
        let matching = self.matching(call);
        self.relink(matching);
        self.relink(call);
    }

    fn matching(&self, call: usize) -> usize {
        match self.entries[call].kind {
            EntryKind::Call { matching, .. } => matching,
            EntryKind::Return { .. } => unreachable!("only call entries are lifted"),
        }
    }

    fn unlink(&mut self, index: usize) {
        let (p, n) = (self.prev[index], self.next[index]);
        self.next[p] = n;
        self.prev[n] = p;
    }

    fn relink(&mut self, index: usize) {
        let (p, n) = (self.prev[index], self.next[index]);
        self.next[p] = index;
        self.prev[n] = index;
    }
}

/// Builds the pending list for one partition: two entries per operation in
/// nondecreasing timestamp order. On a timestamp tie a call sorts before
/// any return that is not its own pair, and input order breaks the
/// remaining ties. Operation ids are the positions in `ops`.
pub(crate) fn build_list<In, Out>(ops: Vec<Operation<In, Out>>) -> EntryList<In, Out> {
    enum Draft<In, Out> {
        Call(In),
        Return(Out),
    }

    let n = ops.len();
    let mut drafts = Vec::with_capacity(n * 2);
    for (id, op) in ops.into_iter().enumerate() {
        drafts.push((op.call, 0u8, id, Draft::Call(op.input)));
        drafts.push((op.ret, 1u8, id, Draft::Return(op.output)));
    }
    drafts.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

    let mut return_at = vec![0; n];
    for (index, draft) in drafts.iter().enumerate() {
        if let Draft::Return(_) = draft.3 {
            return_at[draft.2] = index;
        }
    }
    let entries = drafts
        .into_iter()
        .map(|(_, _, id, draft)| Entry {
            id,
            kind: match draft {
                Draft::Call(input) => EntryKind::Call {
                    input,
                    matching: return_at[id],
                },
                Draft::Return(output) => EntryKind::Return { output },
            },
        })
        .collect();
    EntryList::new(entries)
}
