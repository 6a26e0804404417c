// Huffman tree construction.
//
// Nodes live in an arena (`Vec<Node>`) and refer to their children by index.
// The priority queue holds `(weight, node id)` pairs; node ids grow in
// insertion order (leaves in ascending symbol order, then merged nodes), so
// equal weights always resolve the same way and identical input always yields
// identical codes.
//
// Two placeholder leaves can join the real symbols. The reserved leaf keeps
// codes away from a reserved prefix (see `guard`). The escape leaf has weight
// zero; it pairs with the rarest symbol and leaves one code path unused, so
// byte padding can always be chosen to match no code. Neither placeholder
// appears in the returned table.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use super::Symbol;
use super::encoder::EncodeError;
use super::frequency::FrequencyTable;
use super::guard::{self, ReservedPrefix};
use super::table::{Code, CodeTable, MAX_CODE_LEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Leaf {
    Real(Symbol),
    Reserved,
    Escape,
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Leaf(Leaf),
    /// Children taking the `0` and `1` branch respectively.
    Internal { zero: usize, one: usize },
}

/// Build a prefix-free code table for `freq`.
///
/// With a reserved prefix, no returned code begins with it (see `guard`).
/// Fails with `EmptyAlphabet` for an empty table and `CodeTooLong` if any
/// code would exceed `MAX_CODE_LEN` bits.
pub fn build(
    freq: &FrequencyTable,
    reserved: Option<&ReservedPrefix>,
) -> Result<CodeTable, EncodeError> {
    build_with(freq, reserved, false)
}

/// Like `build`, optionally adding the zero-weight escape leaf.
///
/// A message with a single distinct symbol normally gets the code `0`. With
/// a reserved prefix the lone symbol is split against the reserved leaf
/// instead, so it takes the one-bit code that does not start the prefix:
/// `1` when the prefix begins with `0`, otherwise `0`.
pub fn build_with(
    freq: &FrequencyTable,
    reserved: Option<&ReservedPrefix>,
    escape: bool,
) -> Result<CodeTable, EncodeError> {
    if freq.is_empty() {
        return Err(EncodeError::EmptyAlphabet);
    }

    // A lone symbol has no sibling to split against. Its "0" code already
    // leaves the "1" branch free.
    if freq.len() == 1 && reserved.is_none() {
        let (symbol, _) = freq.iter().next().ok_or(EncodeError::EmptyAlphabet)?;
        return Ok(CodeTable::from_entries(vec![(symbol, Code::ZERO)]));
    }

    let mut nodes: Vec<Node> = Vec::with_capacity(2 * freq.len() + 3);
    let mut heap = BinaryHeap::with_capacity(freq.len() + 2);

    if escape {
        heap.push(Reverse((0, nodes.len())));
        nodes.push(Node::Leaf(Leaf::Escape));
    }
    for (symbol, weight) in freq.iter() {
        heap.push(Reverse((weight, nodes.len())));
        nodes.push(Node::Leaf(Leaf::Real(symbol)));
    }
    if reserved.is_some() {
        heap.push(Reverse((guard::reserved_weight(freq.total()), nodes.len())));
        nodes.push(Node::Leaf(Leaf::Reserved));
    }

    while heap.len() > 1 {
        let (Some(Reverse((lo_w, lo))), Some(Reverse((hi_w, hi)))) = (heap.pop(), heap.pop())
        else {
            break;
        };
        heap.push(Reverse((lo_w.saturating_add(hi_w), nodes.len())));
        nodes.push(Node::Internal { zero: lo, one: hi });
    }
    let Some(Reverse((_, root))) = heap.pop() else {
        return Err(EncodeError::EmptyAlphabet);
    };

    check_depth(&nodes, root)?;
    let (mut codes, reserved_code) = assign_codes(&nodes, root);

    if let Some(prefix) = reserved {
        let reserved_code = reserved_code.unwrap_or(Code::EMPTY);
        guard::orient(prefix, reserved_code, &mut codes);
        debug_assert!(codes.iter().all(|&(_, c)| !prefix.is_prefix_of(c)));
    }

    let table = CodeTable::from_entries(codes);
    log::debug!(
        "built code table: {} symbols, max code length {}, reserved prefix {}, escape {}",
        table.len(),
        table.max_code_len(),
        reserved.map_or_else(|| "none".to_string(), |p| p.to_string()),
        escape,
    );
    Ok(table)
}

/// Reject trees with symbols deeper than the header can describe.
/// Placeholder leaves are never serialized, so their depth does not count.
fn check_depth(nodes: &[Node], root: usize) -> Result<(), EncodeError> {
    let mut deepest: Option<(usize, Symbol)> = None;
    let mut stack = vec![(root, 0usize)];
    while let Some((id, depth)) = stack.pop() {
        match nodes[id] {
            Node::Internal { zero, one } => {
                stack.push((one, depth + 1));
                stack.push((zero, depth + 1));
            }
            Node::Leaf(Leaf::Real(symbol)) => {
                if deepest.is_none_or(|(d, _)| depth > d) {
                    deepest = Some((depth, symbol));
                }
            }
            Node::Leaf(_) => {}
        }
    }

    match deepest {
        Some((depth, symbol)) if depth > MAX_CODE_LEN as usize => Err(EncodeError::CodeTooLong {
            symbol,
            len: depth,
            max: MAX_CODE_LEN,
        }),
        _ => Ok(()),
    }
}

/// Walk the tree, `0` for the lighter child and `1` for the heavier one.
/// Returns the real codes and the reserved leaf's code, if present.
///
/// Depth must already be checked against `MAX_CODE_LEN`. A 16-bit escape
/// path is simply not followed.
fn assign_codes(nodes: &[Node], root: usize) -> (Vec<(Symbol, Code)>, Option<Code>) {
    let mut codes = Vec::with_capacity(nodes.len() / 2 + 1);
    let mut reserved = None;
    let mut stack = vec![(root, Code::EMPTY)];
    while let Some((id, code)) = stack.pop() {
        match nodes[id] {
            Node::Internal { zero, one } => {
                if let (Some(c0), Some(c1)) = (code.push(false), code.push(true)) {
                    stack.push((one, c1));
                    stack.push((zero, c0));
                }
            }
            Node::Leaf(Leaf::Real(symbol)) => codes.push((symbol, code)),
            Node::Leaf(Leaf::Reserved) => reserved = Some(code),
            Node::Leaf(Leaf::Escape) => {}
        }
    }
    (codes, reserved)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
