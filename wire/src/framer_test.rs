use super::*;

#[test]
fn message_type_numeric_mapping_matches_wire_bytes() {
    assert_eq!(MessageType::StateUpdate.as_u8(), 0);
    assert_eq!(MessageType::RoomClosing.as_u8(), 1);
}

#[test]
fn frame_prepends_exactly_one_byte() {
    let wire = frame_message(MessageType::StateUpdate, &[0xAA, 0xBB]);
    assert_eq!(wire, vec![0, 0xAA, 0xBB]);
}

#[test]
fn unframe_round_trips_all_tags_and_payload_lengths() {
    for tag in [MessageType::StateUpdate, MessageType::RoomClosing] {
        for payload in [&b""[..], &b"x"[..], &[0_u8; 9000][..]] {
            let wire = frame_message(tag, payload);
            let (decoded_tag, decoded_payload) = unframe_message(&wire).expect("unframe");
            assert_eq!(decoded_tag, tag);
            assert_eq!(decoded_payload, payload);
        }
    }
}

#[test]
fn unframe_rejects_empty_input() {
    let err = unframe_message(&[]).expect_err("empty input should fail");
    assert_eq!(err, CodecError::EmptyMessage);
}

#[test]
fn unframe_rejects_unknown_type_byte() {
    let err = unframe_message(&[7, 1, 2, 3]).expect_err("tag should be unknown");
    assert_eq!(err, CodecError::UnknownMessageType(7));
}

#[test]
fn room_closing_frame_may_carry_no_payload() {
    let wire = frame_message(MessageType::RoomClosing, &[]);
    assert_eq!(wire, vec![1]);
    let (tag, payload) = unframe_message(&wire).expect("unframe");
    assert_eq!(tag, MessageType::RoomClosing);
    assert!(payload.is_empty());
}
