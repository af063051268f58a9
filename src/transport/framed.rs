//! Length-prefixed message transport.
//!
//! Each message on the wire is a 4-byte big-endian length followed by that
//! many payload bytes. Payloads are opaque chunks of the frame stream; their
//! boundaries carry no meaning. The declared length is checked against the
//! ceiling before any payload is buffered, so an oversized message is
//! rejected without allocating for it. Decoding peeks at the header without
//! consuming it until the whole message is present; encoding delegates to
//! `tokio_util`'s [`LengthDelimitedCodec`].

use std::num::NonZeroUsize;

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec};

use super::TransportError;

/// Length prefix header size (4 bytes for big-endian u32).
pub const LENGTH_HEADER_SIZE: usize = 4;

/// Codec for length-prefixed chunks no larger than one frame.
#[derive(Debug)]
pub struct ChunkCodec {
    inner: LengthDelimitedCodec,
    max_message_size: usize,
}

impl ChunkCodec {
    /// Construct a codec accepting messages up to `max_message_size` bytes.
    #[must_use]
    pub fn new(max_message_size: NonZeroUsize) -> Self {
        Self {
            inner: LengthDelimitedCodec::builder()
                .length_field_length(LENGTH_HEADER_SIZE)
                .max_frame_length(max_message_size.get())
                .new_codec(),
            max_message_size: max_message_size.get(),
        }
    }

    /// Largest payload this codec accepts.
    #[must_use]
    pub const fn max_message_size(&self) -> usize { self.max_message_size }

    fn declared_length(src: &BytesMut) -> Option<usize> {
        src.get(..LENGTH_HEADER_SIZE)
            .and_then(|slice| <[u8; LENGTH_HEADER_SIZE]>::try_from(slice).ok())
            .map(|bytes| usize::try_from(u32::from_be_bytes(bytes)).unwrap_or(usize::MAX))
    }
}

impl Decoder for ChunkCodec {
    type Item = Bytes;
    type Error = TransportError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(size) = Self::declared_length(src) else {
            return Ok(None);
        };
        if size > self.max_message_size {
            return Err(TransportError::OversizedMessage {
                size,
                max: self.max_message_size,
            });
        }

        let needed = LENGTH_HEADER_SIZE + size;
        if src.len() < needed {
            src.reserve(needed - src.len());
            return Ok(None);
        }
        src.advance(LENGTH_HEADER_SIZE);
        Ok(Some(src.split_to(size).freeze()))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Clean close: no data remaining at a message boundary.
        if src.is_empty() {
            return Ok(None);
        }
        match self.decode(src)? {
            Some(chunk) => Ok(Some(chunk)),
            None => Err(TransportError::TruncatedMessage {
                received: src.len().saturating_sub(LENGTH_HEADER_SIZE),
                expected: Self::declared_length(src),
            }),
        }
    }
}

impl Encoder<Bytes> for ChunkCodec {
    type Error = TransportError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.len() > self.max_message_size {
            return Err(TransportError::OversizedMessage {
                size: item.len(),
                max: self.max_message_size,
            });
        }
        self.inner.encode(item, dst)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bytes::BufMut;
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn codec() -> ChunkCodec { ChunkCodec::new(NonZeroUsize::new(8).expect("non-zero")) }

    fn wire(payloads: &[&[u8]]) -> BytesMut {
        let mut buf = BytesMut::new();
        for payload in payloads {
            buf.put_u32(u32::try_from(payload.len()).expect("payload fits u32"));
            buf.put_slice(payload);
        }
        buf
    }

    #[rstest]
    fn decodes_consecutive_messages(mut codec: ChunkCodec) {
        let mut buf = wire(&[&[1, 2, 3], &[], &[4, 5, 6, 7, 8, 9, 10, 11]]);

        assert_eq!(
            codec.decode(&mut buf).expect("decode"),
            Some(Bytes::from_static(&[1, 2, 3]))
        );
        assert_eq!(codec.decode(&mut buf).expect("decode"), Some(Bytes::new()));
        assert_eq!(
            codec.decode(&mut buf).expect("decode").map(|b| b.len()),
            Some(8)
        );
        assert_eq!(codec.decode(&mut buf).expect("decode"), None);
    }

    #[rstest]
    fn waits_for_partial_message(mut codec: ChunkCodec) {
        let mut buf = wire(&[&[1, 2, 3, 4]]);
        let mut tail = buf.split_off(6);

        assert_eq!(codec.decode(&mut buf).expect("decode"), None);
        buf.unsplit(tail.split());
        assert_eq!(
            codec.decode(&mut buf).expect("decode"),
            Some(Bytes::from_static(&[1, 2, 3, 4]))
        );
    }

    #[rstest]
    fn rejects_message_above_ceiling_before_payload_arrives(mut codec: ChunkCodec) {
        let mut buf = BytesMut::new();
        buf.put_u32(9);

        let err = codec.decode(&mut buf).expect_err("oversized");
        assert!(matches!(
            err,
            TransportError::OversizedMessage { size: 9, max: 8 }
        ));
    }

    #[rstest]
    #[case(&[0, 0][..], 0, None)]
    #[case(&[0, 0, 0, 4, 1, 2][..], 2, Some(4))]
    fn eof_inside_message_is_truncation(
        mut codec: ChunkCodec,
        #[case] bytes: &[u8],
        #[case] received: usize,
        #[case] expected: Option<usize>,
    ) {
        let mut buf = BytesMut::from(bytes);
        let err = codec.decode_eof(&mut buf).expect_err("truncated");
        match err {
            TransportError::TruncatedMessage {
                received: r,
                expected: e,
            } => {
                assert_eq!(r, received);
                assert_eq!(e, expected);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[rstest]
    fn clean_eof_at_boundary(mut codec: ChunkCodec) {
        let mut buf = BytesMut::new();
        assert_eq!(codec.decode_eof(&mut buf).expect("clean close"), None);
    }

    #[rstest]
    fn encoder_enforces_ceiling(mut codec: ChunkCodec) {
        let mut dst = BytesMut::new();
        codec
            .encode(Bytes::from_static(&[7; 8]), &mut dst)
            .expect("encode");
        assert_eq!(dst.len(), LENGTH_HEADER_SIZE + 8);

        let err = codec
            .encode(Bytes::from_static(&[7; 9]), &mut dst)
            .expect_err("oversized");
        assert!(matches!(err, TransportError::OversizedMessage { size: 9, .. }));
    }
}
