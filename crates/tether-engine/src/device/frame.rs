/// A frame acquired from a [`WgpuSurface`](super::WgpuSurface).
///
/// The surface keeps the acquired texture until the render loop presents it;
/// the frame only carries the view and the encoder recording into it.
pub struct GpuFrame {
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
    pub format: wgpu::TextureFormat,
}

impl GpuFrame {
    /// Records a render pass that clears the whole frame to `color`.
    pub fn clear(&mut self, color: wgpu::Color) {
        let _rpass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("tether clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }
}
