use rstest::rstest;
use rowcut::{
    parse_str, Delimiter, ErrorKind, ErrorMode, ParseOptions, Parser,
};

fn message_options() -> ParseOptions {
    ParseOptions::new().with_error_mode(ErrorMode::Message)
}

#[rstest]
fn test_basic_records_with_header() {
    let mut parser = Parser::from_slice(b"a,b,c\n1,2,3\n").unwrap();
    assert_eq!(parser.header(), vec!["a", "b", "c"]);

    let row: (String, String, String) = parser.get_next().unwrap();
    assert_eq!(row, ("1".to_string(), "2".to_string(), "3".to_string()));

    assert!(parser.get_next::<(String, String, String)>().is_none());
    assert!(parser.eof());
}

#[rstest]
fn test_without_header_every_line_is_data() {
    let rows: Vec<(String,)> = parse_str("a\nb\nc\n").unwrap();
    let names: Vec<&str> = rows.iter().map(|(s,)| s.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[rstest]
#[case("1;2;3\n", ";")]
#[case("1||2||3\n", "||")]
#[case("1 -> 2 -> 3\n", " -> ")]
fn test_custom_delimiters(#[case] input: &str, #[case] delim: &str) {
    let mut parser = Parser::from_slice_with(
        input.as_bytes(),
        Delimiter::new(delim).unwrap(),
        ParseOptions::new(),
    )
    .unwrap();
    assert_eq!(parser.get_next::<(i64, i64, i64)>(), Some((1, 2, 3)));
}

#[rstest]
fn test_empty_delimiter_rejected() {
    let err = Delimiter::new("").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EmptyDelimiter);
}

#[rstest]
fn test_trailing_and_leading_empty_fields() {
    let mut parser = Parser::from_slice(b",mid,\n").unwrap();
    let row: (String, String, String) = parser.get_next().unwrap();
    assert_eq!(row, (String::new(), "mid".to_string(), String::new()));
}

#[rstest]
fn test_ignore_empty_skips_blank_lines() {
    let input = b"1\n\n\n2\n\n3\n";
    let mut parser =
        Parser::from_slice_with(input, Delimiter::default(), ParseOptions::new().with_ignore_empty())
            .unwrap();
    let values: Vec<i64> = parser
        .records::<(i64,)>()
        .map(|row| row.unwrap().0)
        .collect();
    assert_eq!(values, vec![1, 2, 3]);
}

#[rstest]
fn test_empty_line_is_column_mismatch_without_ignore_empty() {
    let mut parser = Parser::from_slice_with(
        b"1\n\n2\n",
        Delimiter::default(),
        message_options(),
    )
    .unwrap();
    assert_eq!(parser.get_next::<(i64,)>(), Some((1,)));
    assert!(parser.get_next::<(i64,)>().is_none());
    assert_eq!(
        parser.last_error().unwrap().kind(),
        ErrorKind::ColumnCountMismatch
    );
    assert_eq!(parser.get_next::<(i64,)>(), Some((2,)));
}

#[rstest]
fn test_records_iterator_reports_row_errors() {
    let mut parser = Parser::from_slice_with(
        b"1\nbad\n3\n",
        Delimiter::default(),
        message_options(),
    )
    .unwrap();
    let rows: Vec<Result<(i64,), _>> = parser.records::<(i64,)>().collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].as_ref().unwrap(), &(1,));
    assert!(rows[1].is_err());
    assert_eq!(rows[2].as_ref().unwrap(), &(3,));

    let error = rows[1].as_ref().unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidConversion);
    assert!(error.to_string().contains("bad"));
}

#[rstest]
fn test_read_past_eof() {
    let mut parser = Parser::from_slice_with(b"1\n", Delimiter::default(), message_options())
        .unwrap();
    assert_eq!(parser.get_next::<(i64,)>(), Some((1,)));
    assert!(parser.eof());
    assert!(parser.get_next::<(i64,)>().is_none());
    assert_eq!(parser.last_error().unwrap().kind(), ErrorKind::ReadPastEof);
    assert!(parser.error_msg().contains("read on end of file"));
}

#[rstest]
fn test_line_and_position_reporting() {
    let mut parser = Parser::from_slice(b"aa\nbbb\ncc\n").unwrap();
    assert_eq!(parser.line(), 0);
    parser.get_next::<(String,)>().unwrap();
    assert_eq!(parser.line(), 1);
    // Staged record starts after "aa\n".
    assert_eq!(parser.position(), 3);
    parser.get_next::<(String,)>().unwrap();
    assert_eq!(parser.line(), 2);
    assert_eq!(parser.position(), 7);
}

#[rstest]
fn test_ignore_next_skips_record() {
    let mut parser = Parser::from_slice(b"skip\n1\n").unwrap();
    assert!(parser.ignore_next());
    assert_eq!(parser.get_next::<(i64,)>(), Some((1,)));
}

#[rstest]
fn test_file_source_matches_buffer_source() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rows.csv");
    std::fs::write(&path, b"1,one\n2,two\n").unwrap();

    let mut from_file = Parser::from_path(&path).unwrap();
    let data = std::fs::read(&path).unwrap();
    let mut from_buffer = Parser::from_slice(&data).unwrap();

    loop {
        let a = from_file.get_next::<(i64, String)>();
        let b = from_buffer.get_next::<(i64, String)>();
        assert_eq!(a, b);
        if a.is_none() {
            break;
        }
    }
}

#[rstest]
fn test_missing_file_is_source_unavailable() {
    let err = Parser::from_path("definitely/not/here.csv").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SourceUnavailable);
    assert!(err.to_string().contains("could not be opened"));
}

#[rstest]
fn test_parse_path_convenience() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nums.csv");
    std::fs::write(&path, b"1,2\n3,4\n").unwrap();

    let rows: Vec<(i64, i64)> = rowcut::parse_path(&path).unwrap();
    assert_eq!(rows, vec![(1, 2), (3, 4)]);
}

#[rstest]
fn test_flag_mode_records_kind_only() {
    let mut parser = Parser::from_slice_with(
        b"bad\n",
        Delimiter::default(),
        ParseOptions::new().with_error_mode(ErrorMode::Flag),
    )
    .unwrap();
    assert!(parser.get_next::<(i64,)>().is_none());
    assert!(!parser.valid());
    assert_eq!(
        parser.last_error().unwrap().kind(),
        ErrorKind::InvalidConversion
    );
    assert!(parser.error_msg().is_empty());
}

#[rstest]
fn test_message_mode_decorates_with_label_and_line() {
    let mut parser = Parser::from_slice_with(
        b"ok\nbad\n",
        Delimiter::default(),
        message_options(),
    )
    .unwrap();
    parser.get_next::<(String,)>().unwrap();
    assert!(parser.get_next::<(i64,)>().is_none());
    assert!(parser.error_msg().starts_with("buffer line 2: "));
}

#[rstest]
fn test_strict_mode_carries_location() {
    let mut parser = Parser::from_slice_with(
        b"first\nbad\n",
        Delimiter::default(),
        ParseOptions::new().with_error_mode(ErrorMode::Strict),
    )
    .unwrap();
    parser.get_next::<(String,)>().unwrap();
    assert!(parser.get_next::<(i64,)>().is_none());

    let error = parser.last_error().unwrap();
    let location = error.location.unwrap();
    assert_eq!(location.line, 2);
    assert_eq!(location.offset, 6);
}

#[rstest]
fn test_invalid_options_rejected_at_construction() {
    let err = Parser::from_slice_with(
        b"x\n",
        Delimiter::default(),
        ParseOptions::new().with_quote(b'"').with_trim(b'"'),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[rstest]
fn test_round_trip_uncomplicated_input() {
    let line = "alpha,beta,gamma";
    let mut parser = Parser::from_slice(line.as_bytes()).unwrap();
    let (a, b, c): (String, String, String) = parser.get_next().unwrap();
    assert_eq!(format!("{a},{b},{c}"), line);
}
