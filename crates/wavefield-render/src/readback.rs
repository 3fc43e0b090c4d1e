//! Height-map readback for tests and diagnostics.

use half::f16;

use crate::error::{RenderError, RenderResult};

const BYTES_PER_TEXEL: u32 = 8; // Rgba16Float

/// Reads back an `Rgba16Float` texture and returns its R channel as f32.
///
/// Texels are returned row-major, top-left origin. This stalls the queue
/// and exists for diagnostics and integration tests, not the frame path.
pub fn read_r16f_channel(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    width: u32,
    height: u32,
) -> RenderResult<Vec<f32>> {
    let unpadded_bytes_per_row = width * BYTES_PER_TEXEL;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;

    let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("height map readback buffer"),
        size: u64::from(padded_bytes_per_row) * u64::from(height),
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("height map readback encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &staging_buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging_buffer.slice(..);
    let (sender, receiver) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    device.poll(wgpu::PollType::Wait)?;
    receiver
        .recv()
        .map_err(|_| RenderError::ReadbackChannelClosed)??;

    let data = slice.get_mapped_range();
    let expected = padded_bytes_per_row as usize * height as usize;
    if data.len() != expected {
        return Err(RenderError::ReadbackSizeMismatch {
            expected,
            actual: data.len(),
        });
    }

    let mut out = Vec::with_capacity(width as usize * height as usize);
    for row in 0..height as usize {
        let start = row * padded_bytes_per_row as usize;
        let row_bytes = &data[start..start + unpadded_bytes_per_row as usize];
        // Texels are four f16 channels; keep R only.
        for texel in row_bytes.chunks_exact(BYTES_PER_TEXEL as usize) {
            let bits = u16::from_le_bytes([texel[0], texel[1]]);
            out.push(f16::from_bits(bits).to_f32());
        }
    }

    drop(data);
    staging_buffer.unmap();
    Ok(out)
}
