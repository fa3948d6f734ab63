use std::io::{self, Read};

use super::{
    Error, Input, Span,
    buf::Buffer,
};


/// A reader that returns at most one byte per `read` call. Exercises all the
/// refill logic of `Buffer`.
struct Trickle<'a>(&'a [u8]);

impl Read for Trickle<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.0.is_empty() || buf.is_empty() {
            return Ok(0);
        }

        buf[0] = self.0[0];
        self.0 = &self.0[1..];
        Ok(1)
    }
}

#[test]
fn take_until_across_refills() -> Result<(), Error> {
    let mut buf = Buffer::new(Trickle(b"hello world\n"))?;

    let word = buf.take_until(b' ', |sd| Ok(sd.assert_ascii()?.to_string()))?;
    assert_eq!(word, "hello");
    assert_eq!(buf.offset(), 5);

    buf.expect_tag(b" ")?;
    let word = buf.take_until(b'\n', |sd| Ok(sd.assert_ascii()?.to_string()))?;
    assert_eq!(word, "world");
    buf.expect_tag(b"\n")?;
    assert!(buf.is_eof()?);

    Ok(())
}

#[test]
fn take_until_stops_at_eof() -> Result<(), Error> {
    let mut buf = Buffer::new(&b"1.5"[..])?;
    let v = buf.take_until(b' ', |sd| Ok(sd.assert_ascii()?.parse::<f32>().ok()))?;
    assert_eq!(v, Some(1.5));
    assert!(buf.is_eof()?);

    Ok(())
}

#[test]
fn large_lookahead_grows_buffer() -> Result<(), Error> {
    let data = vec![b'a'; 10_000];
    let mut buf = Buffer::new(Trickle(&data))?;

    buf.prepare(10_000)?;
    assert_eq!(buf.len(), 10_000);
    assert!(buf.is_next(b"aaaa")?);

    Ok(())
}

#[test]
fn prepare_past_eof() {
    let mut buf = Buffer::new(&b"abc"[..]).unwrap();
    buf.consume(1);

    match buf.prepare(5) {
        Err(Error::UnexpectedEof(3)) => {}
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn expect_tag_mismatch_has_span() {
    let mut buf = Buffer::new(&b"xx plx"[..]).unwrap();
    buf.consume(3);

    match buf.expect_tag(b"ply") {
        Err(Error::Custom(_, span)) => assert_eq!(span, Span::new(3, 6)),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn binary_scalars() -> Result<(), Error> {
    let mut buf = Buffer::new(&[0x01, 0x02, 0x01, 0x02, 0xff][..])?;

    assert_eq!(super::u16_le(&mut buf)?, 0x0201);
    assert_eq!(super::u16_be(&mut buf)?, 0x0102);
    assert_eq!(super::i8_we(&mut buf)?, -1);
    assert!(buf.is_eof()?);

    Ok(())
}

#[test]
fn non_ascii() {
    let mut buf = Buffer::new(&[b'a', 0xC3, 0xA4, b' '][..]).unwrap();
    let res = buf.take_until(b' ', |sd| sd.assert_ascii().map(|s| s.to_string()));

    match res {
        Err(Error::NotAscii(span)) => assert_eq!(span, Span::new(0, 3)),
        other => panic!("unexpected result: {:?}", other),
    }
}
