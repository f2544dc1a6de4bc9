// [libs/infra/transport/src/framing.rs]
/*!
 * =================================================================
 * APARATO: LENGTH-PREFIXED FRAME CODEC (V4.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: TRAMAS u32-LE + BINCODE CON LÍMITE DURO DE 10MB
 * =================================================================
 */

use crate::envelope::ProtocolEnvelope;
use crate::errors::TransportError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Límite duro de una trama. Un lote DP completo cabe con holgura;
/// cualquier prefijo mayor delata corrupción u hostilidad.
pub const MAX_FRAME_BYTES: u32 = 10 * 1024 * 1024;

/// Escribe un sobre como trama `[longitud u32 LE][cuerpo bincode]`.
///
/// # Errors
/// `Codec` si la serialización falla; `FrameOversize` si el sobre excede
/// el límite; `Io` ante fallo de socket.
pub async fn write_envelope<W: AsyncWrite + Unpin>(
    writer: &mut W,
    envelope: &ProtocolEnvelope,
) -> Result<(), TransportError> {
    let body = bincode::serialize(envelope)?;
    let declared = body.len() as u32;
    if declared > MAX_FRAME_BYTES {
        return Err(TransportError::FrameOversize { declared, cap: MAX_FRAME_BYTES });
    }
    writer.write_all(&declared.to_le_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

/// Lee la próxima trama y deserializa su sobre.
///
/// # Errors
/// `FrameOversize` ante prefijos hostiles (la conexión debe cerrarse);
/// `Io` en EOF o fallo de socket; `Codec` ante cuerpo corrupto.
pub async fn read_envelope<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> Result<ProtocolEnvelope, TransportError> {
    let mut prefix = [0u8; 4];
    reader.read_exact(&mut prefix).await?;
    let declared = u32::from_le_bytes(prefix);
    if declared > MAX_FRAME_BYTES {
        return Err(TransportError::FrameOversize { declared, cap: MAX_FRAME_BYTES });
    }

    let mut body = vec![0u8; declared as usize];
    reader.read_exact(&mut body).await?;
    Ok(bincode::deserialize(&body)?)
}
