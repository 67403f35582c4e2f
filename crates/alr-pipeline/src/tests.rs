use crate::*;
use crate::envelope::write_record;
use alr_core::{Compression, MalformedRecord, NormalizedRecord, RelayError};
use flate2::write::GzEncoder;
use flate2::read::GzDecoder;
use std::io::{Cursor, Read, Write};

const EXAMPLE: &str = r#""2024-01-01 10:00:00",host1,user1,client1,1,2,connect,3,"SELECT 1""#;

fn gzip(payload: &[u8]) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), flate2::Compression::default());
    enc.write_all(payload).unwrap();
    enc.finish().unwrap()
}

fn envelope(messages: &[&str]) -> String {
    let events: Vec<serde_json::Value> = messages
        .iter()
        .enumerate()
        .map(|(i, m)| serde_json::json!({ "id": i.to_string(), "timestamp": 1_705_312_800_000i64 + i as i64, "message": m }))
        .collect();
    serde_json::json!({
        "messageType": "DATA_MESSAGE",
        "owner": "123456789012",
        "logGroup": "/aws/rds/cluster/prod/audit",
        "logStream": "prod-1.audit.log",
        "subscriptionFilters": ["audit"],
        "logEvents": events,
    })
    .to_string()
}

fn rds_line(user: &str, query: &str) -> String {
    format!("20240115 10:00:00,db-host,{user},10.0.0.5,42,1001,QUERY,shop,{query},0")
}

fn lines(sink: &[u8]) -> Vec<serde_json::Value> {
    std::str::from_utf8(sink)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

// ========== Field Extractor ==========

#[test]
fn test_fields_example_mapping() {
    let record = FieldExtractor::new().extract(EXAMPLE).unwrap();
    assert_eq!(record.timestamp, "\"2024-01-01 10:00:00\"");
    assert_eq!(record.host, "host1");
    assert_eq!(record.user, "user1");
    assert_eq!(record.client, "client1");
    assert_eq!(record.command, "connect");
    assert_eq!(record.query, "SELECT 1");
}

#[test]
fn test_fields_example_serialization() {
    let record = FieldExtractor::new().extract(EXAMPLE).unwrap();
    let mut sink = Vec::new();
    write_record(&record, &mut sink).unwrap();
    assert_eq!(
        String::from_utf8(sink).unwrap(),
        "{\"timeStamp\":\"\\\"2024-01-01 10:00:00\\\"\",\"user\":\"user1\",\"client\":\"client1\",\"host\":\"host1\",\"command\":\"connect\",\"query\":\"SELECT 1\"}\n"
    );
}

#[test]
fn test_fields_positional_mapping() {
    for n in 9..14 {
        let mut tokens: Vec<String> = (0..n).map(|i| format!("t{i}")).collect();
        tokens[8] = "'q'".into();
        if n > 9 {
            tokens[8] = "'q".into();
            tokens[n - 2] = format!("{}'", tokens[n - 2]);
        }
        let message = tokens.join(",");
        let record = FieldExtractor::new().extract(&message).unwrap();
        assert_eq!(record.timestamp, "t0");
        assert_eq!(record.host, "t1");
        assert_eq!(record.user, "t2");
        assert_eq!(record.client, "t3");
        assert_eq!(record.command, "t6");
    }
}

#[test]
fn test_fields_too_few() {
    for n in 0..9 {
        let message = vec!["x"; n].join(",");
        let err = FieldExtractor::new().extract(&message).unwrap_err();
        let found = n.max(1);
        assert_eq!(err, MalformedRecord::TooFewFields { found, required: 9 });
    }
}

#[test]
fn test_fields_rds_drops_return_code() {
    let record = FieldExtractor::new().extract(&rds_line("app", "'SELECT 1'")).unwrap();
    assert_eq!(record.command, "QUERY");
    assert_eq!(record.query, "SELECT 1");
}

#[test]
fn test_fields_query_with_separators() {
    let line = rds_line("app", "'SELECT a, b, c FROM t WHERE x IN (1,2)'");
    let record = FieldExtractor::new().extract(&line).unwrap();
    assert_eq!(record.query, "SELECT a, b, c FROM t WHERE x IN (1,2)");
}

#[test]
fn test_fields_empty_query() {
    let record = FieldExtractor::new().extract(&rds_line("app", "''")).unwrap();
    assert_eq!(record.query, "");
}

#[test]
fn test_fields_unwrapped_query() {
    let err = FieldExtractor::new().extract(&rds_line("app", "SELECT 1")).unwrap_err();
    assert_eq!(err, MalformedRecord::UnwrappedQuery { query: "SELECT 1".into() });
}

#[test]
fn test_fields_mismatched_wrappers() {
    let err = FieldExtractor::new().extract(&rds_line("app", "'SELECT 1\"")).unwrap_err();
    assert!(matches!(err, MalformedRecord::UnwrappedQuery { .. }));
}

#[test]
fn test_fields_single_wrapper_char() {
    let err = FieldExtractor::new().unwrap_query("'").unwrap_err();
    assert!(matches!(err, MalformedRecord::UnwrappedQuery { .. }));
}

#[test]
fn test_fields_custom_wrappers() {
    let extractor = FieldExtractor::new().with_wrappers(&['`']);
    assert_eq!(extractor.unwrap_query("`x`").unwrap(), "x");
    assert!(extractor.unwrap_query("'x'").is_err());
}

#[test]
fn test_fields_custom_separator() {
    let extractor = FieldExtractor::new().with_separator('\t');
    let line = "ts\th\tu\tc\t1\t2\tCONNECT\tdb\t'a\tb'\t0";
    let record = extractor.extract(line).unwrap();
    assert_eq!(record.command, "CONNECT");
    assert_eq!(record.query, "a\tb");
}

#[test]
fn test_fields_multibyte_query() {
    let record = FieldExtractor::new().extract(&rds_line("app", "'SELECT \u{3042}'")).unwrap();
    assert_eq!(record.query, "SELECT \u{3042}");
}

// ========== Envelope Decoder ==========

#[test]
fn test_envelope_writes_one_line_per_event() {
    let text = envelope(&[&rds_line("a", "'q1'"), &rds_line("b", "'q2'")]);
    let mut sink = Vec::new();
    let stats = EnvelopeDecoder::default().decode(0, text.as_bytes(), &mut sink).unwrap();
    assert_eq!(stats, DecodeStats { events: 2, records: 2, skipped_control: 0 });
    let out = lines(&sink);
    assert_eq!(out.len(), 2);
    assert_eq!(out[0]["user"], "a");
    assert_eq!(out[1]["query"], "q2");
    assert!(sink.ends_with(b"\n"));
}

#[test]
fn test_envelope_second_of_three_malformed() {
    let text = envelope(&[&rds_line("a", "'q1'"), "broken,line", &rds_line("c", "'q3'")]);
    let mut sink = Vec::new();
    let err = EnvelopeDecoder::default().decode(0, text.as_bytes(), &mut sink).unwrap_err();
    match err {
        RelayError::MalformedRecord { frame, event, source } => {
            assert_eq!(frame, 0);
            assert_eq!(event, 1);
            assert_eq!(source, MalformedRecord::TooFewFields { found: 2, required: 9 });
        }
        other => panic!("unexpected error: {other}"),
    }
    let out = lines(&sink);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0]["user"], "a");
}

#[test]
fn test_envelope_invalid_json() {
    let mut sink = Vec::new();
    let err = EnvelopeDecoder::default().decode(3, b"{not json", &mut sink).unwrap_err();
    assert!(matches!(err, RelayError::Decode { frame: 3, .. }));
    assert_eq!(err.kind(), "decode");
    assert!(sink.is_empty());
}

#[test]
fn test_envelope_wrong_shape() {
    let mut sink = Vec::new();
    let err = EnvelopeDecoder::default()
        .decode(0, br#"{"logEvents": "nope"}"#, &mut sink)
        .unwrap_err();
    assert!(matches!(err, RelayError::Decode { .. }));
}

#[test]
fn test_envelope_no_events() {
    let text = envelope(&[]);
    let mut sink = Vec::new();
    let stats = EnvelopeDecoder::default().decode(0, text.as_bytes(), &mut sink).unwrap();
    assert_eq!(stats.records, 0);
    assert!(sink.is_empty());
}

#[test]
fn test_envelope_control_message_skipped() {
    let text = serde_json::json!({
        "messageType": "CONTROL_MESSAGE",
        "owner": "CloudwatchLogs",
        "logGroup": "",
        "logStream": "",
        "subscriptionFilters": [],
        "logEvents": [{ "id": "", "timestamp": 1, "message": "CWL CONTROL MESSAGE: Checking health of destination" }],
    })
    .to_string();
    let mut sink = Vec::new();
    let stats = EnvelopeDecoder::default().decode(0, text.as_bytes(), &mut sink).unwrap();
    assert_eq!(stats.skipped_control, 1);
    assert!(sink.is_empty());
}

#[test]
fn test_envelope_parse_preserves_order() {
    let text = envelope(&["m0", "m1", "m2"]);
    let parsed = EnvelopeDecoder::default().parse(0, text.as_bytes()).unwrap();
    let messages: Vec<&str> = parsed.log_events.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["m0", "m1", "m2"]);
    assert_eq!(parsed.subscription_filters, vec!["audit".to_string()]);
    assert_eq!(parsed.log_events[2].timestamp, 1_705_312_800_002);
}

// ========== Frames ==========

#[test]
fn test_frames_concatenate_in_order() {
    let payloads: [&[u8]; 3] = [b"alpha\n", b"beta\n", b"gamma\n"];
    let data: Vec<u8> = payloads.iter().flat_map(|p| gzip(p)).collect();
    let mut source = GzipFrames::new(Cursor::new(data));
    let mut out = Vec::new();
    let n = decompress_to(&mut source, &mut out).unwrap();
    assert_eq!(n, 3);
    assert_eq!(out, b"alpha\nbeta\ngamma\n");
}

#[test]
fn test_frames_zero_frames() {
    let mut source = GzipFrames::new(Cursor::new(Vec::new()));
    let mut out = Vec::new();
    assert_eq!(decompress_to(&mut source, &mut out).unwrap(), 0);
    assert!(out.is_empty());
}

#[test]
fn test_frames_round_trip() {
    let payload = envelope(&[&rds_line("a", "'q'")]);
    let mut source = GzipFrames::new(Cursor::new(gzip(payload.as_bytes())));
    let mut out = Vec::new();
    decompress_to(&mut source, &mut out).unwrap();

    let mut roundtrip = Vec::new();
    GzDecoder::new(&gzip(&out)[..]).read_to_end(&mut roundtrip).unwrap();
    assert_eq!(roundtrip, payload.as_bytes());
}

#[test]
fn test_frames_corrupt_second_frame() {
    let mut data = gzip(b"first");
    let mut bad = gzip(b"second frame payload");
    let mid = bad.len() / 2;
    for b in &mut bad[12..mid] {
        *b ^= 0xff;
    }
    data.extend_from_slice(&bad);
    data.extend_from_slice(&gzip(b"third"));

    let mut source = GzipFrames::new(Cursor::new(data));
    let mut out = Vec::new();
    let err = decompress_to(&mut source, &mut out).unwrap_err();
    assert!(matches!(err, RelayError::Decompression { frame: 1, .. }));
    assert_eq!(out, b"first");
}

#[test]
fn test_frames_truncated_frame() {
    let data = gzip(b"payload that will be cut short");
    let cut = data[..data.len() - 4].to_vec();
    let mut source = GzipFrames::new(Cursor::new(cut));
    let err = source.next_frame().unwrap_err();
    assert!(matches!(err, RelayError::Decompression { frame: 0, .. }));
}

// ========== Pipeline ==========

#[test]
fn test_pipeline_multi_frame_accumulates() {
    let f1 = envelope(&[&rds_line("a", "'q1'"), &rds_line("b", "'q2'")]);
    let f2 = envelope(&[&rds_line("c", "'q3'")]);
    let mut data = gzip(f1.as_bytes());
    data.extend_from_slice(&gzip(f2.as_bytes()));

    let mut sink = Vec::new();
    let stats = TransformPipeline::gzip().transform(Cursor::new(data), &mut sink).unwrap();
    assert_eq!(stats.frames, 2);
    assert_eq!(stats.records(), 3);
    let users: Vec<String> = lines(&sink).iter().map(|v| v["user"].as_str().unwrap().to_string()).collect();
    assert_eq!(users, vec!["a", "b", "c"]);
}

#[test]
fn test_pipeline_later_frame_failure_keeps_earlier_records() {
    let mut data = gzip(envelope(&[&rds_line("a", "'q1'")]).as_bytes());
    data.extend_from_slice(&gzip(b"{ definitely not an envelope"));
    data.extend_from_slice(&gzip(envelope(&[&rds_line("c", "'q3'")]).as_bytes()));

    let mut sink = Vec::new();
    let err = TransformPipeline::gzip().transform(Cursor::new(data), &mut sink).unwrap_err();
    assert!(matches!(err, RelayError::Decode { frame: 1, .. }));
    assert_eq!(lines(&sink).len(), 1);
}

#[test]
fn test_pipeline_plain() {
    let text = envelope(&[&rds_line("a", "'q1'")]);
    let mut sink = Vec::new();
    let stats = TransformPipeline::plain()
        .transform(Cursor::new(text.into_bytes()), &mut sink)
        .unwrap();
    assert_eq!(stats.frames, 1);
    assert_eq!(stats.records(), 1);
}

#[test]
fn test_pipeline_sink_path() {
    let p = TransformPipeline::sink_path(std::path::Path::new("/tmp/audit_x/stream-1-2024.gz"));
    assert_eq!(p, std::path::PathBuf::from("/tmp/audit_x/stream-1-2024.gz.json"));
}

#[test]
fn test_pipeline_transform_file() {
    let tmp = tempfile::TempDir::new().unwrap();
    let source = tmp.path().join("prod-rds-mysql-audit-log-stream-1-2024-01-15-10-00-00-abcd");
    let mut data = gzip(envelope(&[&rds_line("a", "'q1'")]).as_bytes());
    data.extend_from_slice(&gzip(envelope(&[&rds_line("b", "'q2'")]).as_bytes()));
    std::fs::write(&source, data).unwrap();

    let outcome = TransformPipeline::default().transform_file(&source).unwrap();
    assert_eq!(outcome.sink_path, TransformPipeline::sink_path(&source));
    assert_eq!(outcome.stats.frames, 2);

    let written = std::fs::read(&outcome.sink_path).unwrap();
    let out = lines(&written);
    assert_eq!(out.len(), 2);
    let first: NormalizedRecord = serde_json::from_value(out[0].clone()).unwrap();
    assert_eq!(first.user, "a");
    assert_eq!(first.query, "q1");
}

#[test]
fn test_pipeline_transform_file_partial_output_flushed() {
    let tmp = tempfile::TempDir::new().unwrap();
    let source = tmp.path().join("source.gz");
    let text = envelope(&[&rds_line("a", "'q1'"), "short,line", &rds_line("c", "'q3'")]);
    std::fs::write(&source, gzip(text.as_bytes())).unwrap();

    let err = TransformPipeline::default().transform_file(&source).unwrap_err();
    assert_eq!(err.kind(), "malformed_record");
    let written = std::fs::read(TransformPipeline::sink_path(&source)).unwrap();
    assert_eq!(lines(&written).len(), 1);
}

#[test]
fn test_pipeline_missing_source() {
    let tmp = tempfile::TempDir::new().unwrap();
    let err = TransformPipeline::default()
        .transform_file(&tmp.path().join("absent"))
        .unwrap_err();
    assert!(matches!(err, RelayError::Io(_)));
}

#[test]
fn test_pipeline_with_extractor() {
    let text = envelope(&["ts,h,u,c,1,2,CMD,db,`x`,0"]);
    let pipeline = TransformPipeline::new(Compression::None)
        .with_extractor(FieldExtractor::new().with_wrappers(&['`']));
    let mut sink = Vec::new();
    pipeline.transform(Cursor::new(text.into_bytes()), &mut sink).unwrap();
    assert_eq!(lines(&sink)[0]["query"], "x");
}
