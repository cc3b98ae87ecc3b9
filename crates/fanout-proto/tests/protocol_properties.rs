//! Round-trip properties for the wire protocol, run against arbitrary
//! inputs rather than hand-picked examples.

use std::io::Cursor;

use fanout_proto::{InboundMessage, RelayRequest, Verb, codec};
use proptest::prelude::*;

fn arbitrary_receivers() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(any::<u64>(), 0..=fanout_proto::id_list::MAX_ELEMENTS)
}

fn arbitrary_body() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=4096)
}

proptest! {
    #[test]
    fn verb_round_trips(verb in prop::sample::select(vec![Verb::WhoAmI, Verb::WhoIsHere, Verb::Relay])) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let mut wire = Vec::new();
            codec::write_verb(&mut wire, verb).await.unwrap();

            let mut cursor = Cursor::new(wire);
            let decoded = codec::read_verb(&mut cursor).await.unwrap();
            prop_assert_eq!(decoded, verb);
            Ok(())
        })?;
    }

    #[test]
    fn relay_request_round_trips(receivers in arbitrary_receivers(), body in arbitrary_body()) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let request = RelayRequest { receivers, body };

            let mut wire = Vec::new();
            request.write(&mut wire).await.unwrap();

            let mut cursor = Cursor::new(wire);
            let decoded = RelayRequest::read(&mut cursor, u32::MAX).await.unwrap();
            prop_assert_eq!(decoded, request);
            Ok(())
        })?;
    }

    #[test]
    fn inbound_message_round_trips(sender in any::<u64>(), body in arbitrary_body()) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let message = InboundMessage { sender, body };

            let mut wire = Vec::new();
            message.write(&mut wire).await.unwrap();

            let mut cursor = Cursor::new(wire);
            let decoded = InboundMessage::read(&mut cursor, u32::MAX).await.unwrap();
            prop_assert_eq!(decoded, message);
            Ok(())
        })?;
    }
}
