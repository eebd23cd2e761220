//! Integration tests for the RGA-Split CRDT implementation.
//!
//! These tests verify the correctness of the engine across end-to-end
//! scenarios including basic editing, concurrent operations, causal delete
//! filtering, and convergence properties.

use crdt_rga_split::{
    ACTOR_ID_SIZE, ActorId, MaxCreatedAtMap, Text, TextNodeId, TextNodePos, Ticket,
};

fn actor(byte: u8) -> ActorId {
    ActorId::new([byte; ACTOR_ID_SIZE])
}

fn ticket(lamport: u64, actor_byte: u8) -> Ticket {
    Ticket::new(lamport, 0, actor(actor_byte))
}

fn new_text() -> Text {
    Text::new(ticket(1, 1))
}

/// The position at the head sentinel, where every empty document starts.
fn head_pos() -> TextNodePos {
    TextNodePos::new(TextNodeId::new(Ticket::INITIAL, 0), 0)
}

#[test]
fn test_simple_insert() {
    let mut text = new_text();

    let (from, to) = text.find_boundary(0, 0).unwrap();
    let (caret, deleted) = text.edit(&from, &to, None, "Hello", ticket(1, 1)).unwrap();

    assert_eq!(text.marshal(), "Hello");
    assert_eq!(caret.absolute_id(), TextNodeId::new(ticket(1, 1), 5));
    assert!(deleted.is_empty());
    assert_eq!(text.nodes().count(), 1);
}

#[test]
fn test_replace_middle() {
    let mut text = new_text();

    let (from, to) = text.find_boundary(0, 0).unwrap();
    text.edit(&from, &to, None, "Hello", ticket(1, 1)).unwrap();

    let (from, to) = text.find_boundary(2, 4).unwrap();
    let (caret, deleted) = text.edit(&from, &to, None, "y", ticket(2, 1)).unwrap();

    assert_eq!(text.marshal(), "Heyo");
    assert_eq!(text.len(), 4);
    assert_eq!(caret.absolute_id(), TextNodeId::new(ticket(2, 1), 1));
    assert_eq!(deleted[&actor(1)], ticket(1, 1));
}

#[test]
fn test_concurrent_inserts_converge() {
    // Two actors insert at the head concurrently. The later ticket wins the
    // head anchor, so both replicas must read "BA" whatever the delivery
    // order.
    let edit_a = ("A", ticket(1, 1));
    let edit_b = ("B", ticket(2, 2));

    for order in [[edit_a, edit_b], [edit_b, edit_a]] {
        let mut replica = new_text();
        for (content, at) in order {
            replica
                .edit(
                    &head_pos(),
                    &head_pos(),
                    Some(&MaxCreatedAtMap::new()),
                    content,
                    at,
                )
                .unwrap();
        }
        assert_eq!(replica.marshal(), "BA");
    }
}

#[test]
fn test_causal_delete_skip() {
    // Actor A inserts "X"; actor B concurrently deletes [0, 1) with a
    // frontier that has not seen A's insert.
    let insert_at = ticket(1, 1);
    let delete_at = ticket(2, 2);
    let delete_from = head_pos();
    let delete_to = TextNodePos::new(TextNodeId::new(insert_at, 0), 1);
    let mut frontier = MaxCreatedAtMap::new();
    frontier.insert(actor(1), Ticket::INITIAL);

    // In-order replica: the causal filter spares the insert.
    let mut in_order = new_text();
    let (from, to) = in_order.find_boundary(0, 0).unwrap();
    in_order.edit(&from, &to, None, "X", insert_at).unwrap();
    let (_, deleted) = in_order
        .edit(&delete_from, &delete_to, Some(&frontier), "", delete_at)
        .unwrap();
    assert!(deleted.is_empty());
    assert_eq!(in_order.marshal(), "X");

    // Out-of-order replica: the delete arrives first and applies as a pure
    // no-op, then the insert lands.
    let mut out_of_order = new_text();
    let (caret, deleted) = out_of_order
        .edit(&delete_from, &delete_to, Some(&frontier), "", delete_at)
        .unwrap();
    assert_eq!(caret, delete_from);
    assert!(deleted.is_empty());
    let (from, to) = out_of_order.find_boundary(0, 0).unwrap();
    out_of_order.edit(&from, &to, None, "X", insert_at).unwrap();
    assert_eq!(out_of_order.marshal(), "X");

    assert_eq!(in_order.marshal(), out_of_order.marshal());
}

#[test]
fn test_split_across_delete_range() {
    let mut text = new_text();

    let (from, to) = text.find_boundary(0, 0).unwrap();
    text.edit(&from, &to, None, "ABCDE", ticket(1, 1)).unwrap();

    let (from, to) = text.find_boundary(1, 4).unwrap();
    let mut frontier = MaxCreatedAtMap::new();
    frontier.insert(actor(1), ticket(1, 1));
    let (_, deleted) = text
        .edit(&from, &to, Some(&frontier), "x", ticket(2, 2))
        .unwrap();

    assert_eq!(text.marshal(), "AxE");
    assert_eq!(deleted[&actor(1)], ticket(1, 1));

    // The original run is now three fragments sharing one creation ticket;
    // the middle one is a tombstone.
    let fragments: Vec<_> = text
        .nodes()
        .filter(|n| n.id().created_at() == ticket(1, 1))
        .map(|n| (n.id().offset(), n.value().to_string(), n.is_removed()))
        .collect();
    assert_eq!(
        fragments,
        vec![
            (0, "A".to_string(), false),
            (1, "BCD".to_string(), true),
            (4, "E".to_string(), false),
        ]
    );

    // The insertion-history chain links the fragments in offset order.
    let chain: Vec<_> = text
        .nodes()
        .filter(|n| n.id().created_at() == ticket(1, 1))
        .map(|n| (n.id(), n.ins_prev_id()))
        .collect();
    assert_eq!(chain[0], (TextNodeId::new(ticket(1, 1), 0), None));
    assert_eq!(
        chain[1],
        (
            TextNodeId::new(ticket(1, 1), 1),
            Some(TextNodeId::new(ticket(1, 1), 0))
        )
    );
    assert_eq!(
        chain[2],
        (
            TextNodeId::new(ticket(1, 1), 4),
            Some(TextNodeId::new(ticket(1, 1), 1))
        )
    );
}

#[test]
fn test_deep_copy_fidelity() {
    let mut text = new_text();
    let (from, to) = text.find_boundary(0, 0).unwrap();
    text.edit(&from, &to, None, "ABCDE", ticket(1, 1)).unwrap();
    let (from, to) = text.find_boundary(1, 4).unwrap();
    text.edit(&from, &to, None, "x", ticket(2, 2)).unwrap();

    let copy = text.deep_copy();

    assert_eq!(copy.annotated_string(), text.annotated_string());
    assert_eq!(copy.marshal(), text.marshal());
    assert_eq!(copy.len(), text.len());

    let originals: Vec<_> = text
        .nodes()
        .map(|n| (n.id(), n.deleted_at(), n.ins_prev_id()))
        .collect();
    let copies: Vec<_> = copy
        .nodes()
        .map(|n| (n.id(), n.deleted_at(), n.ins_prev_id()))
        .collect();
    assert_eq!(copies, originals);
}

#[test]
fn test_permutation_convergence() {
    // Three edits: two concurrent head inserts and a delete of the first
    // byte of B's insert. Replayed in every order that delivers the delete
    // after its target, all replicas converge.
    let insert_a = (head_pos(), head_pos(), None, "abc", ticket(1, 1));
    let insert_b = (head_pos(), head_pos(), None, "XY", ticket(2, 2));
    let delete_x = (
        head_pos(),
        TextNodePos::new(TextNodeId::new(ticket(2, 2), 0), 1),
        Some({
            let mut m = MaxCreatedAtMap::new();
            m.insert(actor(2), ticket(2, 2));
            m
        }),
        "",
        ticket(3, 1),
    );

    let orders = [
        [&insert_a, &insert_b, &delete_x],
        [&insert_b, &insert_a, &delete_x],
        [&insert_b, &delete_x, &insert_a],
    ];

    let mut results = Vec::new();
    for order in orders {
        let mut replica = new_text();
        for (from, to, map, content, at) in order {
            replica.edit(from, to, map.as_ref(), content, *at).unwrap();
        }
        results.push(replica.marshal());
    }

    assert_eq!(results[0], "Yabc");
    assert!(results.iter().all(|r| r == &results[0]));
}

#[test]
fn test_idempotent_tombstone() {
    let mut text = new_text();
    let (from, to) = text.find_boundary(0, 0).unwrap();
    text.edit(&from, &to, None, "abc", ticket(1, 1)).unwrap();

    let (from, to) = text.find_boundary(0, 3).unwrap();
    let (_, deleted) = text.edit(&from, &to, None, "", ticket(5, 2)).unwrap();
    assert_eq!(deleted[&actor(1)], ticket(1, 1));
    assert_eq!(text.marshal(), "");

    // Re-deleting the same range with the same and with an earlier ticket
    // mutates nothing and reports nothing.
    let before = text.annotated_string();
    for at in [ticket(5, 2), ticket(3, 2)] {
        let (_, deleted) = text.edit(&from, &to, None, "", at).unwrap();
        assert!(deleted.is_empty());
        assert_eq!(text.annotated_string(), before);
    }
}
