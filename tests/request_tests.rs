use trellis::{CookieOptions, Request, Response};

#[test]
fn test_multipart_upload_single_file_part() {
    let body = "------B\r\n\
                Content-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\
                Content-Type: text/plain\r\n\
                \r\n\
                hello\n\r\n\
                ------B--\r\n";
    let raw = format!(
        "POST /upload HTTP/1.1\r\n\
         Host: x\r\n\
         Content-Type: multipart/form-data; boundary=----B\r\n\
         Content-Length: {}\r\n\
         \r\n\
         {}",
        body.len(),
        body
    );

    let req = Request::parse(raw.as_bytes()).unwrap();
    let field = req.form_field("file").expect("file field decoded");
    assert!(field.is_file());
    assert_eq!(field.bytes().unwrap(), b"hello\n");
    assert_eq!(field.filename().unwrap(), "a.txt");
    assert_eq!(field.content_type().unwrap(), "text/plain");
}

#[test]
fn test_multipart_mixed_parts() {
    let body = "--xyz\r\n\
                Content-Disposition: form-data; name=\"title\"\r\n\
                \r\n\
                my upload\r\n\
                --xyz\r\n\
                Content-Disposition: form-data; name=\"data\"; filename=\"b.bin\"\r\n\
                Content-Type: application/octet-stream\r\n\
                \r\n\
                \x00\x01\x02\r\n\
                --xyz--\r\n";
    let raw = format!(
        "POST /upload HTTP/1.1\r\n\
         Content-Type: multipart/form-data; boundary=xyz\r\n\
         Content-Length: {}\r\n\
         \r\n\
         {}",
        body.len(),
        body
    );

    let req = Request::parse(raw.as_bytes()).unwrap();
    let title = req.form_field("title").unwrap();
    assert!(!title.is_file());
    assert_eq!(title.value().unwrap(), "my upload");

    let data = req.form_field("data").unwrap();
    assert!(data.is_file());
    assert_eq!(data.bytes().unwrap(), b"\x00\x01\x02");
}

#[test]
fn test_signed_cookie_round_trip_through_wire_format() {
    // Server side: set a signed cookie on a response.
    let mut res = Response::new();
    res.set_signed_cookie("session", "user-7", "topsecret", &CookieOptions::default());
    let raw = String::from_utf8_lossy(&res.to_bytes()).to_string();
    let cookie_line = raw
        .lines()
        .find(|l| l.starts_with("Set-Cookie: session="))
        .expect("set-cookie emitted");
    let wire_value = cookie_line
        .trim_start_matches("Set-Cookie: session=")
        .split(';')
        .next()
        .unwrap();

    // Client side: the cookie comes back on the next request.
    let next = format!("GET / HTTP/1.1\r\nCookie: session={wire_value}\r\n\r\n");
    let req = Request::parse(next.as_bytes()).unwrap();
    assert_eq!(req.signed_cookie("session", "topsecret").as_deref(), Some("user-7"));

    // Wrong secret or a tampered value yields nothing.
    assert_eq!(req.signed_cookie("session", "other"), None);
    let tampered = format!(
        "GET / HTTP/1.1\r\nCookie: session={}\r\n\r\n",
        wire_value.replacen("user-7", "user-8", 1)
    );
    let req = Request::parse(tampered.as_bytes()).unwrap();
    assert_eq!(req.signed_cookie("session", "topsecret"), None);
}

#[test]
fn test_cookie_attributes_on_the_wire() {
    let mut res = Response::new();
    res.set_cookie(
        "prefs",
        "dark",
        &CookieOptions {
            max_age: Some(3600),
            path: Some("/".into()),
            http_only: true,
            ..CookieOptions::default()
        },
    );
    let raw = String::from_utf8_lossy(&res.to_bytes()).to_string();
    let line = raw
        .lines()
        .find(|l| l.starts_with("Set-Cookie: prefs="))
        .unwrap();
    assert!(line.contains("prefs=dark"));
    assert!(line.contains("Max-Age=3600"));
    assert!(line.contains("Expires="));
    assert!(line.contains("GMT"));
    assert!(line.contains("Path=/"));
    assert!(line.contains("HttpOnly"));
}

#[test]
fn test_consumed_byte_count_matches_content_length() {
    // Two pipelined requests in one buffer; framing must consume
    // exactly header_end + 4 + content_length bytes for the first.
    let first = b"POST /a HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello".to_vec();
    let second = b"GET /b HTTP/1.1\r\n\r\n".to_vec();
    let mut buffer = first.clone();
    buffer.extend_from_slice(&second);

    let header_end = trellis::http::find_header_end(&buffer).unwrap();
    let length = trellis::http::content_length(&buffer[..header_end]).unwrap();
    let total = header_end + 4 + length;
    assert_eq!(total, first.len());

    let req = Request::parse(&buffer[..total]).unwrap();
    assert_eq!(req.path, "/a");
    assert_eq!(req.body, b"hello");

    let rest = &buffer[total..];
    let req = Request::parse(rest).unwrap();
    assert_eq!(req.path, "/b");
}
