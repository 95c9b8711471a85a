mod common;

use std::time::Duration;

use chrono::NaiveDate;
use common::{binary_client, client, header_len, reply, words, MockTransport};
use melsec_mc::codec::CommType;
use melsec_mc::frame::FrameType;
use melsec_mc::{
    mc_error_description, AccessOptions, Client, ClientConfig, CpuState, CpuStatus, DataType,
    McError, PlcSeries, ReconnectPolicy, StopCause, SwitchStatus, Tag, Value,
};

fn config() -> ClientConfig {
    ClientConfig::new("127.0.0.1", PlcSeries::Q)
}

/// Payload of the `n`th request, after the frame header.
fn payload(client: &Client<MockTransport>, n: usize) -> Vec<u8> {
    let start = header_len(client.config());
    client.transport().sent[n][start..].to_vec()
}

fn push(client: &mut Client<MockTransport>, status: u16, data: &[u8]) {
    let frame = reply(client.config(), status, data);
    client.transport_mut().push(frame);
}

#[test]
fn test_batch_read_words_binary() {
    let mut client = binary_client();
    push(&mut client, 0, &words(&[100, 0xFFFF, 0x1234]));

    let values = client.batch_read_words("D100", 3).unwrap();
    assert_eq!(values, vec![100, -1, 0x1234]);

    let expected = hex::decode(concat!(
        "500000ffff0300", // subheader + route
        "0c00",           // length
        "0400",           // timer
        "01040000",       // batch read, word units
        "640000a8",       // D100
        "0300",           // count
    ))
    .unwrap();
    assert_eq!(client.transport().sent[0], expected);
}

#[test]
fn test_batch_read_words_raw_keeps_wire_bytes() {
    let mut client = binary_client();
    push(&mut client, 0, &[0x01, 0x02, 0x03, 0x04]);
    let raw = client.batch_read_words_raw("D0", 2).unwrap();
    assert_eq!(raw, vec![vec![0x01, 0x02], vec![0x03, 0x04]]);
}

#[test]
fn test_bits_written_then_read_back() {
    for values in [vec![true, false, true], vec![true, true, false, true]] {
        let mut client = binary_client();
        push(&mut client, 0, &[]);
        client.batch_write_bits("M0", &values).unwrap();

        let written = payload(&client, 0)[10..].to_vec();
        assert_eq!(written.len(), values.len().div_ceil(2));
        push(&mut client, 0, &written);

        let read = client.batch_read_bits("M0", values.len() as u16).unwrap();
        assert_eq!(read, values);
    }
}

#[test]
fn test_bit_packing_on_the_wire() {
    let mut client = binary_client();
    push(&mut client, 0, &[]);
    client.batch_write_bits("M0", &[true, false, true]).unwrap();
    assert_eq!(&payload(&client, 0)[10..], &[0x10, 0x10]);

    push(&mut client, 0, &[]);
    client
        .batch_write_bits("Y0", &[true, true, false, true])
        .unwrap();
    assert_eq!(&payload(&client, 1)[10..], &[0x11, 0x01]);
}

#[test]
fn test_random_read_words_and_dwords() {
    let mut client = binary_client();
    let mut data = words(&[0xFFFE, 7]);
    data.extend((-100_000i32).to_le_bytes());
    push(&mut client, 0, &data);

    let (w, d) = client.random_read(&["D1000", "W0A"], &["D2000"]).unwrap();
    assert_eq!(w, vec![-2, 7]);
    assert_eq!(d, vec![-100_000]);

    let p = payload(&client, 0);
    assert_eq!(&p[..6], &[0x03, 0x04, 0x00, 0x00, 0x02, 0x01]);
    assert_eq!(&p[6..10], &[0xE8, 0x03, 0x00, 0xA8]);
    assert_eq!(&p[10..14], &[0x0A, 0x00, 0x00, 0xB4]);
}

#[test]
fn test_random_read_raw_keeps_wire_bytes() {
    let mut client = binary_client();
    push(&mut client, 0, &[0x02, 0x01, 0x78, 0x56, 0x34, 0x12]);

    let (w, d) = client.random_read_raw(&["D0"], &["D10"]).unwrap();
    assert_eq!(w, vec![vec![0x02, 0x01]]);
    assert_eq!(d, vec![vec![0x78, 0x56, 0x34, 0x12]]);
    assert_eq!(&payload(&client, 0)[..6], &[0x03, 0x04, 0x00, 0x00, 0x01, 0x01]);
}

#[test]
fn test_random_write_words_and_dwords() {
    let mut client = binary_client();
    push(&mut client, 0, &[]);
    client
        .random_write(&[("D0", -1), ("W1F", 2)], &[("D100", 70_000)])
        .unwrap();

    let expected = hex::decode(concat!(
        "02140000", // random write, word units
        "0201",     // two words, one dword
        "000000a8ffff",
        "1f0000b40200",
        "640000a870110100",
    ))
    .unwrap();
    assert_eq!(payload(&client, 0), expected);
}

#[test]
fn test_random_access_rejects_bit_devices() {
    let mut client = binary_client();

    let err = client.random_read(&["M0"], &[]).unwrap_err();
    assert!(matches!(err, McError::InvalidParameter { .. }));
    let err = client.random_read_raw(&["D0"], &["Y0"]).unwrap_err();
    assert!(matches!(err, McError::InvalidParameter { .. }));
    let err = client.random_write(&[("X10", 1)], &[]).unwrap_err();
    assert!(matches!(err, McError::InvalidParameter { .. }));
    let err = client.random_write(&[], &[("B0", 1)]).unwrap_err();
    assert!(matches!(err, McError::InvalidParameter { .. }));

    assert!(client.transport().sent.is_empty());
}

#[test]
fn test_word_tags_reject_bit_devices() {
    let mut client = binary_client();

    let err = client.read(&[Tag::new("M0", "h")]).unwrap_err();
    assert!(matches!(err, McError::InvalidParameter { .. }));
    let err = client
        .write(&[Tag::with_value("X0", "H", 1u16)])
        .unwrap_err();
    assert!(matches!(err, McError::InvalidParameter { .. }));

    assert!(client.transport().sent.is_empty());
}

#[test]
fn test_random_write_bits_iqr_uses_word_values() {
    let mut client = client(ClientConfig::new("127.0.0.1", PlcSeries::IqR));
    push(&mut client, 0, &[]);
    client.random_write_bits(&[("M10", true)]).unwrap();
    let p = payload(&client, 0);
    // command, subcommand 3, one point, 6-byte device, word value
    assert_eq!(&p[..5], &[0x02, 0x14, 0x03, 0x00, 0x01]);
    assert_eq!(p.len(), 5 + 6 + 2);
    assert_eq!(&p[11..], &[0x01, 0x00]);
}

#[test]
fn test_double_tag_spans_four_words() {
    let mut client = binary_client();
    push(&mut client, 0, &[]);
    let result = client
        .write(&[Tag::with_value("D100", DataType::Double, 1.5f64)])
        .unwrap();
    assert!(result.is_none());

    let p = payload(&client, 0);
    assert_eq!(&p[..6], &[0x02, 0x14, 0x00, 0x00, 0x04, 0x00]);
    let mut written = Vec::new();
    for i in 0..4 {
        let entry = &p[6 + i * 6..12 + i * 6];
        assert_eq!(&entry[..4], &[100 + i as u8, 0x00, 0x00, 0xA8]);
        written.extend_from_slice(&entry[4..]);
    }
    assert_eq!(written, 1.5f64.to_le_bytes());

    push(&mut client, 0, &written);
    let tags = client.read(&[Tag::new("D100", "d")]).unwrap();
    assert_eq!(tags[0].value, Some(Value::Float(1.5)));
    assert_eq!(tags[0].data_type, "DOUBLE");
    assert!(tags[0].is_ok());
}

#[test]
fn test_float_tag_is_rounded() {
    let mut client = binary_client();
    let raw = 3.14f32.to_bits();
    push(&mut client, 0, &words(&[raw as u16, (raw >> 16) as u16]));
    let tags = client.read(&[Tag::new("D200", DataType::Float)]).unwrap();
    assert_eq!(tags[0].value, Some(Value::Float(3.14)));
}

#[test]
fn test_read_keeps_order_and_isolates_bad_types() {
    let mut client = binary_client();
    push(&mut client, 0, &words(&[5]));
    push(&mut client, 0, &[0x10]);

    let tags = client
        .read(&[Tag::new("D0", "h"), Tag::new("D1", "x"), Tag::new("M0", "b")])
        .unwrap();
    assert_eq!(tags.len(), 3);
    assert_eq!(tags[0].value, Some(Value::Int(5)));
    assert_eq!(tags[1].device, "D1");
    assert!(tags[1].value.is_none());
    assert!(tags[1].error.as_deref().unwrap().contains("\"x\""));
    assert_eq!(tags[2].value, Some(Value::Bit(true)));
    assert_eq!(client.transport().sent.len(), 2);
}

#[test]
fn test_read_only_bad_types_sends_nothing() {
    let mut client = binary_client();
    let tags = client.read(&[Tag::new("D0", "zz")]).unwrap();
    assert!(tags[0].error.is_some());
    assert!(client.transport().sent.is_empty());
}

#[test]
fn test_read_propagates_plc_errors() {
    let mut client = binary_client();
    push(&mut client, 0xC056, &[]);
    let err = client.read(&[Tag::new("D0", "h")]).unwrap_err();
    assert_eq!(err.end_code(), Some(0xC056));
}

#[test]
fn test_write_reports_failed_tags() {
    let mut client = binary_client();
    push(&mut client, 0, &[]);
    push(&mut client, 0, &[]);
    let failed = client
        .write(&[
            Tag::with_value("M0", "b", true),
            Tag::with_value("D0", "?", 1i16),
            Tag::with_value("D1", "H", 65535u16),
        ])
        .unwrap()
        .unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].device, "D0");
    assert_eq!(client.transport().sent.len(), 2);
}

#[test]
fn test_write_rejects_out_of_range_and_missing_values() {
    let mut client = binary_client();
    let err = client
        .write(&[Tag::with_value("D0", "H", -1i16)])
        .unwrap_err();
    assert!(matches!(err, McError::ValueRange { .. }));

    let err = client.write(&[Tag::new("D0", "h")]).unwrap_err();
    assert!(matches!(err, McError::InvalidParameter { .. }));
    assert!(client.transport().sent.is_empty());
}

#[test]
fn test_end_codes() {
    let mut client = binary_client();
    push(&mut client, 0xC056, &[]);
    let err = client.batch_read_words("D0", 1).unwrap_err();
    assert!(matches!(err, McError::Plc { code: 0xC056 }));
    assert!(mc_error_description(0xC056).is_some());

    push(&mut client, 0x9999, &[]);
    let err = client.batch_write_words("D0", &[1]).unwrap_err();
    assert_eq!(err.end_code(), Some(0x9999));
    assert!(mc_error_description(0x9999).is_none());
}

#[test]
fn test_response_split_across_chunks() {
    let mut client = binary_client();
    let frame = reply(client.config(), 0, &words(&[1, 2]));
    let (head, tail) = frame.split_at(5);
    client.transport_mut().push(head.to_vec());
    client.transport_mut().push(tail.to_vec());
    assert_eq!(client.batch_read_words("D0", 2).unwrap(), vec![1, 2]);
}

#[test]
fn test_connection_closed_mid_response() {
    let mut client = binary_client();
    client.transport_mut().push(vec![0xD0, 0x00, 0x00]);
    client.transport_mut().push(Vec::new());
    let err = client.batch_read_words("D0", 1).unwrap_err();
    assert!(matches!(err, McError::InvalidResponse { .. }));
}

#[test]
fn test_ascii_frames() {
    let mut client = client(config().with_comm_type(CommType::Ascii));
    push(&mut client, 0, b"0064FFFF");

    let values = client.batch_read_words("D100", 2).unwrap();
    assert_eq!(values, vec![100, -1]);
    assert_eq!(
        String::from_utf8(client.transport().sent[0].clone()).unwrap(),
        "500000FF03FF000018000404010000D*0001000002"
    );
}

#[test]
fn test_ascii_bits_one_char_per_point() {
    let mut client = client(config().with_comm_type(CommType::Ascii));
    push(&mut client, 0, &[]);
    client.batch_write_bits("M0", &[true, false, true]).unwrap();
    assert_eq!(&payload(&client, 0)[20..], b"101");

    push(&mut client, 0, b"101");
    assert_eq!(
        client.batch_read_bits("M0", 3).unwrap(),
        vec![true, false, true]
    );
}

#[test]
fn test_4e_serial_checked() {
    let cfg = config().with_frame_type(FrameType::E4).with_serial(0x1234);
    let mut client = client(cfg.clone());
    push(&mut client, 0, &words(&[9]));
    assert_eq!(client.batch_read_words("D0", 1).unwrap(), vec![9]);
    assert_eq!(&client.transport().sent[0][..6], &[0x54, 0x00, 0x34, 0x12, 0x00, 0x00]);

    let stale = reply(&cfg.with_serial(0x1235), 0, &words(&[9]));
    client.transport_mut().push(stale);
    let err = client.batch_read_words("D0", 1).unwrap_err();
    assert!(matches!(err, McError::InvalidResponse { .. }));
}

#[test]
fn test_4e_ascii_frames() {
    let cfg = config()
        .with_frame_type(FrameType::E4)
        .with_comm_type(CommType::Ascii)
        .with_serial(0x1234);
    let mut client = client(cfg);
    push(&mut client, 0, b"0009FFFE");

    assert_eq!(client.batch_read_words("D100", 2).unwrap(), vec![9, -2]);
    assert_eq!(
        String::from_utf8(client.transport().sent[0].clone()).unwrap(),
        "54001234000000FF03FF000018000404010000D*0001000002"
    );
}

#[test]
fn test_set_access_options_updates_frames_and_timeout() {
    let mut client = binary_client();
    client
        .set_access_options(AccessOptions {
            network: Some(2),
            module_station: Some(5),
            timer_sec: Some(2),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(
        client.transport().timeouts.last(),
        Some(&Duration::from_secs(3))
    );

    push(&mut client, 0, &[]);
    client.remote_stop().unwrap();
    let sent = &client.transport().sent[0];
    assert_eq!(sent[2], 2);
    assert_eq!(sent[6], 5);
    assert_eq!(&sent[9..11], &[0x08, 0x00]);
}

#[test]
fn test_password_length_per_series() {
    let mut client = binary_client();
    push(&mut client, 0, &[]);
    client.remote_unlock("1234").unwrap();
    assert_eq!(
        payload(&client, 0),
        vec![0x30, 0x16, 0x00, 0x00, 0x04, 0x00, b'1', b'2', b'3', b'4']
    );
    assert!(matches!(
        client.remote_lock("123456"),
        Err(McError::InvalidParameter { .. })
    ));

    let mut iqr = common::client(ClientConfig::new("127.0.0.1", PlcSeries::IqR));
    push(&mut iqr, 0, &[]);
    iqr.remote_lock("123456").unwrap();
    assert!(iqr.remote_unlock("1234").is_err());
    assert!(iqr.remote_unlock(&"a".repeat(33)).is_err());
    assert_eq!(iqr.transport().sent.len(), 1);
}

#[test]
fn test_remote_run_payload() {
    let mut client = binary_client();
    push(&mut client, 0, &[]);
    client.remote_run(2, true).unwrap();
    assert_eq!(
        payload(&client, 0),
        vec![0x01, 0x10, 0x00, 0x00, 0x03, 0x00, 0x02, 0x00]
    );
    assert!(client.remote_run(3, false).is_err());
}

#[test]
fn test_remote_reset_answered() {
    let mut client = binary_client();
    push(&mut client, 0, &[]);
    client.remote_reset().unwrap();
    let t = client.transport();
    assert_eq!(t.connects, 0);
    assert_eq!(t.timeouts, vec![Duration::from_secs(1), Duration::from_secs(2)]);
}

#[test]
fn test_remote_reset_reconnects() {
    let policy = ReconnectPolicy {
        attempts: 2,
        backoff: Duration::ZERO,
    };
    let mut client = client(config().with_reconnect_policy(policy));
    client.remote_reset().unwrap();
    let t = client.transport();
    assert_eq!(t.closes, 1);
    assert_eq!(t.connects, 1);
    assert!(client.is_connected());

    let mut client = common::client(config().with_reconnect_policy(policy));
    client.transport_mut().refuse_connect = true;
    assert!(matches!(client.remote_reset(), Err(McError::Timeout)));
    assert_eq!(client.transport().connects, 2);
}

#[test]
fn test_indicator_led_channels() {
    let mut client = binary_client();
    push(&mut client, 0, &[]);
    client.indicator_led_off(3).unwrap();
    assert_eq!(payload(&client, 0), vec![0x17, 0x16, 0x0F, 0x00]);
    assert!(client.indicator_led_off(4).is_err());

    push(&mut client, 0, &[]);
    client.error_led_off().unwrap();
    assert_eq!(payload(&client, 1), vec![0x17, 0x16, 0x00, 0x00]);
}

#[test]
fn test_read_cpu_model() {
    let mut client = binary_client();
    let mut data = b"Q03UDVCPU       ".to_vec();
    data.extend(0x0366u16.to_le_bytes());
    push(&mut client, 0, &data);
    let model = client.read_cpu_model().unwrap();
    assert_eq!(model.name, "Q03UDVCPU");
    assert_eq!(model.code, "0366");
}

#[test]
fn test_read_cpu_model_ascii() {
    let mut client = client(config().with_comm_type(CommType::Ascii));
    push(&mut client, 0, b"Q03UDVCPU       0366");
    let model = client.read_cpu_model().unwrap();
    assert_eq!(model.name, "Q03UDVCPU");
    assert_eq!(model.code, "0366");
    assert_eq!(payload(&client, 0), b"01010000");
}

#[test]
fn test_cpu_status_never_fails() {
    let mut client = binary_client();
    push(&mut client, 0, &words(&[0x0012]));
    let status = client.read_cpu_status();
    assert_eq!(status.state, Some(CpuState::Stop));
    assert_eq!(status.cause, Some(StopCause::RemoteRelay));

    push(&mut client, 0xC059, &[]);
    assert_eq!(client.read_cpu_status(), CpuStatus::UNKNOWN);

    // nothing queued: timeout
    assert_eq!(client.read_cpu_status(), CpuStatus::UNKNOWN);
}

#[test]
fn test_switch_status() {
    let mut client = binary_client();
    push(&mut client, 0, &words(&[1]));
    assert_eq!(client.read_switch_status(), Some(SwitchStatus::Stop));
    push(&mut client, 0, &words(&[9]));
    assert_eq!(client.read_switch_status(), None);
    assert_eq!(client.read_switch_status(), Some(SwitchStatus::Unknown));
}

#[test]
fn test_read_plc_time() {
    let mut client = binary_client();
    push(&mut client, 0, &[]);
    push(&mut client, 0, &words(&[2024, 5, 17, 13, 45, 30, 5, 0]));
    push(&mut client, 0, &[]);

    let time = client.read_plc_time().unwrap();
    let expected = NaiveDate::from_ymd_opt(2024, 5, 17)
        .unwrap()
        .and_hms_opt(13, 45, 30)
        .unwrap();
    assert_eq!(time, expected);
    assert_eq!(client.transport().sent.len(), 3);
    // SM213 on, then off
    assert_eq!(payload(&client, 0)[10..], [0x10]);
    assert_eq!(payload(&client, 2)[10..], [0x00]);
}

#[test]
fn test_read_plc_time_releases_latch_on_error() {
    let mut client = binary_client();
    push(&mut client, 0, &[]);
    push(&mut client, 0xC051, &[]);
    push(&mut client, 0xC059, &[]);
    let err = client.read_plc_time().unwrap_err();
    assert_eq!(err.end_code(), Some(0xC051));
    assert_eq!(client.transport().sent.len(), 3);
}

#[test]
fn test_read_plc_time_reports_failed_release() {
    let mut client = binary_client();
    push(&mut client, 0, &[]);
    push(&mut client, 0, &words(&[2024, 5, 17, 13, 45, 30, 5, 0]));
    push(&mut client, 0xC059, &[]);
    let err = client.read_plc_time().unwrap_err();
    assert_eq!(err.end_code(), Some(0xC059));
}

#[test]
fn test_set_plc_time_weekday_counts_from_sunday() {
    let mut client = binary_client();
    for _ in 0..5 {
        push(&mut client, 0, &[]);
    }
    let sunday = NaiveDate::from_ymd_opt(2024, 5, 19)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    client.set_plc_time(sunday).unwrap();
    let clock = payload(&client, 1);
    assert_eq!(&clock[22..24], &[0x00, 0x00]);
}

#[test]
fn test_set_plc_time_sequence() {
    let mut client = binary_client();
    for _ in 0..5 {
        push(&mut client, 0, &[]);
    }
    let time = NaiveDate::from_ymd_opt(2024, 5, 17)
        .unwrap()
        .and_hms_opt(13, 45, 30)
        .unwrap();
    client.set_plc_time(time).unwrap();

    assert_eq!(client.transport().sent.len(), 5);
    let clock = payload(&client, 1);
    assert_eq!(&clock[10..], &words(&[2024, 5, 17, 13, 45, 30, 5, 0])[..]);
    let strobes: Vec<u8> = (2..5).map(|i| payload(&client, i)[10]).collect();
    assert_eq!(strobes, vec![0x00, 0x10, 0x00]);
}

#[test]
fn test_sync_plc_time_returns_written_time() {
    let mut client = binary_client();
    for _ in 0..5 {
        push(&mut client, 0, &[]);
    }
    let written = client.sync_plc_time(true).unwrap();
    let clock = payload(&client, 1);
    assert_eq!(
        u16::from_le_bytes([clock[10], clock[11]]) as i32,
        chrono::Datelike::year(&written)
    );
}

#[test]
fn test_loopback() {
    let mut client = binary_client();
    let mut data = 7u16.to_le_bytes().to_vec();
    data.extend_from_slice(b"TEST123");
    push(&mut client, 0, &data);
    let result = client.loopback_test("TEST123").unwrap();
    assert_eq!(result.length, 7);
    assert_eq!(result.data, "TEST123");
}

#[test]
fn test_loopback_length_mismatch() {
    let mut client = binary_client();
    let mut data = 6u16.to_le_bytes().to_vec();
    data.extend_from_slice(b"TEST12");
    push(&mut client, 0, &data);
    let err = client.loopback_test("TEST123").unwrap_err();
    assert!(matches!(
        err,
        McError::ContentMismatch {
            expected: 7,
            received: 6
        }
    ));
    assert!(client.loopback_test("TEST-1").is_err());
}

#[test]
fn test_unknown_device_for_series() {
    let mut client = binary_client();
    let err = client.batch_read_words("LTN0", 1).unwrap_err();
    assert!(matches!(err, McError::DeviceCode { .. }));
    assert!(client.transport().sent.is_empty());
}
