use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::core::{WireLayout, WireMapped};
use crate::error::Error;

#[async_trait]
/// Destination of encoded frames, e.g. a file or a socket.
///
/// Frames are written verbatim, with no header or checksum.
pub trait FrameSink {
    async fn send_frame(&mut self, bytes: &[u8]) -> Result<(), std::io::Error>;
}

#[async_trait]
impl<T> FrameSink for T
where
    T: AsyncWrite + Unpin + Send,
{
    async fn send_frame(&mut self, bytes: &[u8]) -> Result<(), std::io::Error> {
        self.write_all(bytes).await?;
        self.flush().await
    }
}

/// Encode `domain` into a `W` frame and send it to `sink`. Returns the number of bytes written.
pub async fn write_frame<W, D>(sink: &mut dyn FrameSink, domain: &D) -> Result<usize, Error>
where
    W: WireLayout + 'static,
    D: WireMapped<W>,
{
    let bytes = domain.to_bytes()?;
    sink.send_frame(bytes.as_ref()).await?;
    tracing::trace!(bytes = W::SIZE, "frame written");

    Ok(W::SIZE)
}

/// Read exactly one `W` frame from `source` and update the mapped fields of `domain`.
pub async fn read_frame<W, D, R>(source: &mut R, domain: &mut D) -> Result<(), Error>
where
    W: WireLayout + 'static,
    D: WireMapped<W>,
    R: AsyncRead + Unpin + Send,
{
    let mut bytes = vec![0u8; W::SIZE];
    source.read_exact(&mut bytes).await?;
    tracing::trace!(bytes = W::SIZE, "frame read");

    domain.update_from_bytes(&bytes)?;

    Ok(())
}
