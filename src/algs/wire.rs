//! Byte encoding of grid rows for the halo exchange.
//!
//! A row travels as its `f32` values in native byte order; every worker of a
//! group runs the same binary. Decoding never assumes the receive buffer is
//! aligned.

use crate::solver_error::SolverError;

/// Bytes occupied by one row of `cols` values.
#[inline]
pub const fn row_bytes(cols: usize) -> usize {
    cols * std::mem::size_of::<f32>()
}

pub fn cast_slice(v: &[f32]) -> &[u8] {
    bytemuck::cast_slice(v)
}

pub fn expect_exact_len(actual: usize, expected: usize) -> Result<(), String> {
    if actual == expected {
        Ok(())
    } else {
        Err(format!("expected {expected} bytes, got {actual}"))
    }
}

/// Decode a message from `peer` into `dst`, checking its length first.
pub fn decode_row_into(peer: usize, bytes: &[u8], dst: &mut [f32]) -> Result<(), SolverError> {
    expect_exact_len(bytes.len(), row_bytes(dst.len())).map_err(|e| SolverError::comm(peer, e))?;
    for (v, chunk) in dst
        .iter_mut()
        .zip(bytes.chunks_exact(std::mem::size_of::<f32>()))
    {
        *v = bytemuck::pod_read_unaligned(chunk);
    }
    Ok(())
}
