use crate::protocol::{
    CMD_BYE, CMD_EXEC, CMD_GETVAR, CMD_SETVAR, Request, TYPE_ARRAY, TYPE_NULL, kind_from_tag,
    kind_tag,
};

use models::{VarKind, Variable};

/// **VALUE**: Pins the SET frame layout byte for byte.
///
/// **WHY THIS MATTERS**: SET is the only request with three fields. Swapping the type tag
/// and the name, or dropping the tag, breaks every variable binding on the peer.
///
/// **BUG THIS CATCHES**: Would catch field reordering or a missing type tag.
#[test]
fn given_int_variable_when_set_request_encoded_then_layout_is_command_name_tag_value() {
    // GIVEN: x = 42
    let var = Variable::int("x", 42).unwrap();

    // WHEN: Encoding a SET
    let bytes = Request::Set(&var).encode().unwrap();

    // THEN: [0][len=1]["x"][tag=1][42]
    assert_eq!(
        bytes,
        vec![0, 0, 0, 0, 1, 0, 0, 0, b'x', 1, 0, 0, 0, 42, 0, 0, 0]
    );
}

#[test]
fn given_name_when_get_request_encoded_then_layout_is_command_and_name() {
    // GIVEN/WHEN: GET "ab"
    let bytes = Request::Get("ab").encode().unwrap();

    // THEN: [1][len=2]["ab"]
    assert_eq!(bytes, vec![1, 0, 0, 0, 2, 0, 0, 0, b'a', b'b']);
}

#[test]
fn given_code_when_exec_request_encoded_then_code_is_sent_verbatim() {
    // GIVEN/WHEN: EXEC with a string the client must not interpret
    let bytes = Request::Exec("a; b").encode().unwrap();

    // THEN: [2][len=4]["a; b"]
    assert_eq!(bytes, vec![2, 0, 0, 0, 4, 0, 0, 0, b'a', b';', b' ', b'b']);
}

#[test]
fn given_bye_when_encoded_then_is_single_negative_one_word() {
    // GIVEN/WHEN: BYE
    let bytes = Request::Bye.encode().unwrap();

    // THEN: Just -1, little-endian
    assert_eq!(bytes, vec![0xFF, 0xFF, 0xFF, 0xFF]);
}

#[test]
fn given_each_request_when_command_called_then_returns_its_command_code() {
    let var = Variable::bool("flag", true).unwrap();

    assert_eq!(Request::Set(&var).command(), CMD_SETVAR);
    assert_eq!(Request::Get("flag").command(), CMD_GETVAR);
    assert_eq!(Request::Exec("noop").command(), CMD_EXEC);
    assert_eq!(Request::Bye.command(), CMD_BYE);
}

/// **VALUE**: Every kind has a unique tag that maps back to the same kind.
///
/// **WHY THIS MATTERS**: The tag table is the contract with the peer. Two kinds sharing a
/// tag, or a tag decoding to the wrong kind, swaps types silently.
///
/// **BUG THIS CATCHES**: Would catch a copy-paste error in either half of the mapping, or
/// the reserved array/null markers being accepted as value tags.
#[test]
fn given_all_kinds_when_mapped_to_tags_then_mapping_is_unique_and_reversible() {
    // GIVEN: Every kind
    let tags: Vec<i32> = VarKind::ALL.iter().map(|k| kind_tag(*k)).collect();

    // THEN: Each tag maps back to its kind
    for kind in VarKind::ALL {
        assert_eq!(kind_from_tag(kind_tag(kind)), Some(kind));
    }

    // AND: Tags are 1..=9 with no duplicates
    let mut sorted = tags.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, (1..=9).collect::<Vec<_>>());

    // AND: Reserved markers are not value tags
    assert_eq!(kind_from_tag(TYPE_ARRAY), None);
    assert_eq!(kind_from_tag(TYPE_NULL), None);
}
