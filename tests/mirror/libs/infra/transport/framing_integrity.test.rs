// [tests/mirror/libs/infra/transport/framing_integrity.test.rs]
/**
 * =================================================================
 * APARATO: FRAMING CERTIFIER (V4.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-INFRA
 * RESPONSABILIDAD: PARIDAD DE TRAMAS Y RECHAZO DE SOBRES HOSTILES
 * =================================================================
 */

use canguro_domain_models::WireDistinguishedPoint;
use canguro_infra_transport::{
    read_envelope, write_envelope, ProtocolEnvelope, TransportError, MAX_FRAME_BYTES,
    PROTOCOL_VERSION,
};
use tokio::io::AsyncWriteExt;

#[tokio::test]
async fn certify_envelope_round_trips() {
    let (mut client_end, mut server_end) = tokio::io::duplex(1 << 20);

    let envelopes = vec![
        ProtocolEnvelope::Hello {
            version: PROTOCOL_VERSION,
            worker_label: "canguro-node-alpha".to_string(),
        },
        ProtocolEnvelope::Config {
            dp_size: 14,
            range_start: [0x11; 32],
            range_end: [0x22; 32],
            key_x: [0x33; 32],
            key_y: [0x44; 32],
        },
        ProtocolEnvelope::DpBatch {
            records: vec![
                WireDistinguishedPoint {
                    kangaroo_index: 0,
                    shard: 77,
                    x_bits: 0xAABB_CCDD_0000,
                    packed_delta: (1 << 126) | 0x1234,
                },
                WireDistinguishedPoint {
                    kangaroo_index: 0,
                    shard: 78,
                    x_bits: 0xFFFF_0000,
                    packed_delta: 0x9,
                },
            ],
        },
        ProtocolEnvelope::Status {
            found: true,
            total_count: 123_456,
            private_key: Some([0x5A; 32]),
            fault: None,
        },
        ProtocolEnvelope::Status {
            found: false,
            total_count: 0,
            private_key: None,
            fault: Some("protocol v0 unsupported".to_string()),
        },
        ProtocolEnvelope::Bye,
    ];

    for envelope in envelopes {
        write_envelope(&mut client_end, &envelope).await.expect("write");
        let received = read_envelope(&mut server_end).await.expect("read");
        assert_eq!(received, envelope);
    }
}

#[tokio::test]
async fn certify_back_to_back_frames() {
    let (mut client_end, mut server_end) = tokio::io::duplex(1 << 20);

    for ordinal in 0..16u32 {
        let envelope = ProtocolEnvelope::Status {
            found: false,
            total_count: u64::from(ordinal),
            private_key: None,
            fault: None,
        };
        write_envelope(&mut client_end, &envelope).await.expect("write");
    }
    for ordinal in 0..16u64 {
        match read_envelope(&mut server_end).await.expect("read") {
            ProtocolEnvelope::Status { total_count, .. } => assert_eq!(total_count, ordinal),
            other => panic!("unexpected envelope: {other:?}"),
        }
    }
}

#[tokio::test]
async fn certify_oversize_prefix_rejected() {
    let (mut hostile_end, mut victim_end) = tokio::io::duplex(1 << 16);

    // Prefijo hostil: declara 11MB sin cuerpo
    let declared = MAX_FRAME_BYTES + 1;
    hostile_end.write_all(&declared.to_le_bytes()).await.expect("prefix");

    match read_envelope(&mut victim_end).await {
        Err(TransportError::FrameOversize { declared: reported, cap }) => {
            assert_eq!(reported, declared);
            assert_eq!(cap, MAX_FRAME_BYTES);
        }
        other => panic!("expected oversize rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn certify_truncated_body_is_io_fault() {
    let (mut hostile_end, mut victim_end) = tokio::io::duplex(1 << 16);

    // Declara 64 bytes y entrega 3 antes de colgar
    hostile_end.write_all(&64u32.to_le_bytes()).await.expect("prefix");
    hostile_end.write_all(&[1, 2, 3]).await.expect("partial body");
    drop(hostile_end);

    assert!(matches!(
        read_envelope(&mut victim_end).await,
        Err(TransportError::Io(_))
    ));
}
