use super::{FrameUniforms, GpuMaterial};
use crate::config::MaterialConfig;
use crate::core::{load_texture_image, Texture, TextureImage};
use crate::mesh::{Material, MeshPackage, Submesh, Vertex};
use crate::scene::FlyCamera;
use objc2::msg_send;
use objc2::rc::Retained;
use objc2::runtime::ProtocolObject;
use objc2_core_foundation::CGSize;
use objc2_foundation::NSString;
use objc2_metal::{
    MTLBlendFactor, MTLBlendOperation, MTLBuffer, MTLClearColor, MTLCommandBuffer,
    MTLCommandEncoder, MTLCommandQueue, MTLCompareFunction, MTLCompileOptions,
    MTLCreateSystemDefaultDevice, MTLDepthStencilDescriptor, MTLDepthStencilState, MTLDevice,
    MTLDrawable, MTLIndexType, MTLLibrary, MTLLoadAction, MTLPixelFormat, MTLPrimitiveType,
    MTLRenderCommandEncoder, MTLRenderPassDescriptor, MTLRenderPipelineDescriptor,
    MTLRenderPipelineState, MTLResourceOptions, MTLSamplerAddressMode, MTLSamplerDescriptor,
    MTLSamplerMinMagFilter, MTLSamplerState, MTLStoreAction, MTLTexture, MTLTextureDescriptor,
    MTLTextureUsage, MTLVertexDescriptor, MTLVertexFormat,
};
use objc2_quartz_core::{CAMetalDrawable, CAMetalLayer};
use tracing::{info, warn};
use winit::raw_window_handle::RawWindowHandle;

const FRAME_BUFFER_INDEX: usize = 1;
const MATERIAL_BUFFER_INDEX: usize = 2;

/// One indexed draw: a submesh plus whether it needs blending.
struct DrawBatch {
    submesh: Submesh,
    translucent: bool,
}

/// Uploads one [`MeshPackage`] and draws it once per frame, one indexed draw
/// call per submesh with its material bound.
pub struct MeshRenderer {
    device: Retained<ProtocolObject<dyn MTLDevice>>,
    command_queue: Retained<ProtocolObject<dyn MTLCommandQueue>>,
    layer: Retained<CAMetalLayer>,
    opaque_pipeline_state: Retained<ProtocolObject<dyn MTLRenderPipelineState>>,
    blended_pipeline_state: Retained<ProtocolObject<dyn MTLRenderPipelineState>>,
    depth_stencil_state: Retained<ProtocolObject<dyn MTLDepthStencilState>>,
    translucent_depth_stencil_state: Retained<ProtocolObject<dyn MTLDepthStencilState>>,
    depth_texture: Option<Retained<ProtocolObject<dyn MTLTexture>>>,
    sampler_state: Retained<ProtocolObject<dyn MTLSamplerState>>,
    vertex_buffer: Retained<ProtocolObject<dyn MTLBuffer>>,
    index_buffer: Retained<ProtocolObject<dyn MTLBuffer>>,
    material_buffer: Retained<ProtocolObject<dyn MTLBuffer>>,
    uniform_buffer: Retained<ProtocolObject<dyn MTLBuffer>>,
    material_textures: Vec<Retained<ProtocolObject<dyn MTLTexture>>>,
    batches: Vec<DrawBatch>,
    drawable_size: (u32, u32),
}

impl MeshRenderer {
    pub fn new(
        window_handle: RawWindowHandle,
        width: u32,
        height: u32,
        package: &MeshPackage,
        material_config: &MaterialConfig,
    ) -> Result<Self, String> {
        let device = MTLCreateSystemDefaultDevice()
            .ok_or_else(|| "Failed to get default Metal device".to_string())?;

        let command_queue = device
            .newCommandQueue()
            .ok_or_else(|| "Failed to create command queue".to_string())?;

        let layer = Self::create_metal_layer(&device, window_handle)?;

        let opaque_pipeline_state = Self::create_pipeline_state(&device, false)?;
        let blended_pipeline_state = Self::create_pipeline_state(&device, true)?;
        let depth_stencil_state = Self::create_depth_stencil_state(&device, true)?;
        let translucent_depth_stencil_state = Self::create_depth_stencil_state(&device, false)?;
        let depth_texture = Self::create_depth_texture(&device, width, height)?;
        let sampler_state = Self::create_sampler_state(&device)?;

        let vertex_buffer = Self::create_buffer(&device, package.vertices(), "vertex")?;
        let index_buffer = Self::create_buffer(&device, package.indices(), "index")?;

        let white = Texture::from_image(&device, &TextureImage::white())
            .map_err(|e| format!("Failed to create fallback texture: {e}"))?;
        let mut material_textures = Vec::with_capacity(package.materials().len());
        let mut gpu_materials = Vec::with_capacity(package.materials().len());
        for material in package.materials() {
            let texture = Self::load_material_texture(&device, material);
            let has_texture = texture.is_some();
            gpu_materials.push(GpuMaterial::new(material, has_texture, material_config));
            material_textures.push(texture.unwrap_or_else(|| white.texture.clone()));
        }
        let material_buffer = Self::create_buffer(&device, &gpu_materials, "material")?;
        let uniform_buffer = device
            .newBufferWithLength_options(
                std::mem::size_of::<FrameUniforms>(),
                MTLResourceOptions::empty(),
            )
            .ok_or_else(|| "Failed to create uniform buffer".to_string())?;

        let batches = package
            .submeshes()
            .iter()
            .map(|submesh| DrawBatch {
                submesh: *submesh,
                translucent: gpu_materials
                    .get(submesh.material_index as usize)
                    .is_some_and(GpuMaterial::is_translucent),
            })
            .collect();

        info!(
            "Uploaded mesh: {} vertices, {} triangles, {} draw batches",
            package.vertices().len(),
            package.triangle_count(),
            package.submeshes().len()
        );

        let renderer = Self {
            device,
            command_queue,
            layer,
            opaque_pipeline_state,
            blended_pipeline_state,
            depth_stencil_state,
            translucent_depth_stencil_state,
            depth_texture: Some(depth_texture),
            sampler_state,
            vertex_buffer,
            index_buffer,
            material_buffer,
            uniform_buffer,
            material_textures,
            batches,
            drawable_size: (width, height),
        };
        renderer.set_layer_size(width, height);
        Ok(renderer)
    }

    /// Missing or unreadable textures fall back to the white placeholder.
    fn load_material_texture(
        device: &ProtocolObject<dyn MTLDevice>,
        material: &Material,
    ) -> Option<Retained<ProtocolObject<dyn MTLTexture>>> {
        let path = material.texture_path.as_ref()?;
        match load_texture_image(path).and_then(|image| Texture::from_image(device, &image)) {
            Ok(texture) => {
                info!(
                    "Loaded texture {} ({}x{})",
                    path.display(),
                    texture.width,
                    texture.height
                );
                Some(texture.texture)
            }
            Err(e) => {
                warn!("{e}, drawing untextured");
                None
            }
        }
    }

    fn create_metal_layer(
        device: &ProtocolObject<dyn MTLDevice>,
        window_handle: RawWindowHandle,
    ) -> Result<Retained<CAMetalLayer>, String> {
        let layer = unsafe { CAMetalLayer::new() };

        unsafe {
            layer.setDevice(Some(device));
            layer.setPixelFormat(MTLPixelFormat::BGRA8Unorm);
            layer.setOpaque(true);
        }

        match window_handle {
            RawWindowHandle::AppKit(handle) => unsafe {
                use objc2::runtime::AnyObject;

                let view = handle.ns_view.as_ptr().cast::<AnyObject>();
                let _: () = msg_send![view, setWantsLayer: true];
                let _: () = msg_send![view, setLayer: &*layer];
            },
            _ => return Err("Unsupported window handle type".to_string()),
        }

        Ok(layer)
    }

    fn create_buffer<T>(
        device: &ProtocolObject<dyn MTLDevice>,
        data: &[T],
        label: &str,
    ) -> Result<Retained<ProtocolObject<dyn MTLBuffer>>, String> {
        let buffer_size = std::mem::size_of_val(data);

        let data_ptr = std::ptr::NonNull::new(data.as_ptr().cast::<std::ffi::c_void>().cast_mut())
            .ok_or_else(|| format!("Failed to create NonNull pointer for {label} data"))?;

        // Safety: data_ptr points to buffer_size bytes that live for the whole call.
        // Metal copies the data during buffer creation.
        let buffer = unsafe {
            device.newBufferWithBytes_length_options(
                data_ptr,
                buffer_size,
                MTLResourceOptions::empty(),
            )
        }
        .ok_or_else(|| format!("Failed to create {label} buffer"))?;

        Ok(buffer)
    }

    fn create_pipeline_state(
        device: &ProtocolObject<dyn MTLDevice>,
        blended: bool,
    ) -> Result<Retained<ProtocolObject<dyn MTLRenderPipelineState>>, String> {
        let shader_source = include_str!("../shaders/mesh.metal");
        let shader_source = NSString::from_str(shader_source);

        let compile_options = MTLCompileOptions::new();
        let library = device
            .newLibraryWithSource_options_error(&shader_source, Some(&compile_options))
            .map_err(|e| format!("Failed to compile shaders: {e:?}"))?;

        let vertex_function = library
            .newFunctionWithName(&NSString::from_str("mesh_vertex"))
            .ok_or_else(|| "Failed to find vertex shader".to_string())?;

        let fragment_function = library
            .newFunctionWithName(&NSString::from_str("mesh_fragment"))
            .ok_or_else(|| "Failed to find fragment shader".to_string())?;

        let vertex_descriptor = unsafe { MTLVertexDescriptor::new() };

        unsafe {
            let position_attr = vertex_descriptor.attributes().objectAtIndexedSubscript(0);
            position_attr.setFormat(MTLVertexFormat::Float3);
            position_attr.setOffset(std::mem::offset_of!(Vertex, position));
            position_attr.setBufferIndex(0);

            let normal_attr = vertex_descriptor.attributes().objectAtIndexedSubscript(1);
            normal_attr.setFormat(MTLVertexFormat::Float3);
            normal_attr.setOffset(std::mem::offset_of!(Vertex, normal));
            normal_attr.setBufferIndex(0);

            let tex_coord_attr = vertex_descriptor.attributes().objectAtIndexedSubscript(2);
            tex_coord_attr.setFormat(MTLVertexFormat::Float2);
            tex_coord_attr.setOffset(std::mem::offset_of!(Vertex, tex_coord));
            tex_coord_attr.setBufferIndex(0);

            let layout = vertex_descriptor.layouts().objectAtIndexedSubscript(0);
            layout.setStride(std::mem::size_of::<Vertex>());
        }

        let pipeline_descriptor = MTLRenderPipelineDescriptor::new();
        pipeline_descriptor.setVertexFunction(Some(&vertex_function));
        pipeline_descriptor.setFragmentFunction(Some(&fragment_function));
        pipeline_descriptor.setVertexDescriptor(Some(&vertex_descriptor));

        unsafe {
            let color_attachment = pipeline_descriptor
                .colorAttachments()
                .objectAtIndexedSubscript(0);
            color_attachment.setPixelFormat(MTLPixelFormat::BGRA8Unorm);

            if blended {
                color_attachment.setBlendingEnabled(true);
                color_attachment.setSourceRGBBlendFactor(MTLBlendFactor::SourceAlpha);
                color_attachment.setDestinationRGBBlendFactor(MTLBlendFactor::OneMinusSourceAlpha);
                color_attachment.setRgbBlendOperation(MTLBlendOperation::Add);
                color_attachment.setSourceAlphaBlendFactor(MTLBlendFactor::One);
                color_attachment
                    .setDestinationAlphaBlendFactor(MTLBlendFactor::OneMinusSourceAlpha);
                color_attachment.setAlphaBlendOperation(MTLBlendOperation::Add);
            }
        }

        pipeline_descriptor.setDepthAttachmentPixelFormat(MTLPixelFormat::Depth32Float);

        let pipeline_state = device
            .newRenderPipelineStateWithDescriptor_error(&pipeline_descriptor)
            .map_err(|e| format!("Failed to create pipeline state: {e:?}"))?;

        Ok(pipeline_state)
    }

    fn create_depth_stencil_state(
        device: &ProtocolObject<dyn MTLDevice>,
        depth_write: bool,
    ) -> Result<Retained<ProtocolObject<dyn MTLDepthStencilState>>, String> {
        let descriptor = unsafe { MTLDepthStencilDescriptor::new() };
        descriptor.setDepthCompareFunction(MTLCompareFunction::Less);
        descriptor.setDepthWriteEnabled(depth_write);

        let state = device
            .newDepthStencilStateWithDescriptor(&descriptor)
            .ok_or_else(|| "Failed to create depth stencil state".to_string())?;

        Ok(state)
    }

    fn create_depth_texture(
        device: &ProtocolObject<dyn MTLDevice>,
        width: u32,
        height: u32,
    ) -> Result<Retained<ProtocolObject<dyn MTLTexture>>, String> {
        let descriptor = unsafe { MTLTextureDescriptor::new() };
        unsafe {
            descriptor.setPixelFormat(MTLPixelFormat::Depth32Float);
            descriptor.setWidth(width.max(1) as usize);
            descriptor.setHeight(height.max(1) as usize);
            descriptor.setUsage(MTLTextureUsage::RenderTarget);
        }

        let texture = device
            .newTextureWithDescriptor(&descriptor)
            .ok_or_else(|| "Failed to create depth texture".to_string())?;

        Ok(texture)
    }

    fn create_sampler_state(
        device: &ProtocolObject<dyn MTLDevice>,
    ) -> Result<Retained<ProtocolObject<dyn MTLSamplerState>>, String> {
        let descriptor = MTLSamplerDescriptor::new();
        descriptor.setMinFilter(MTLSamplerMinMagFilter::Linear);
        descriptor.setMagFilter(MTLSamplerMinMagFilter::Linear);
        // Tiled UVs go past 1.0.
        descriptor.setSAddressMode(MTLSamplerAddressMode::Repeat);
        descriptor.setTAddressMode(MTLSamplerAddressMode::Repeat);

        let sampler = device
            .newSamplerStateWithDescriptor(&descriptor)
            .ok_or_else(|| "Failed to create sampler state".to_string())?;

        Ok(sampler)
    }

    pub fn render(&mut self, camera: &FlyCamera, time: f32) -> Result<(), String> {
        let drawable = unsafe { self.layer.nextDrawable() }
            .ok_or_else(|| "Failed to get next drawable".to_string())?;

        let command_buffer = self
            .command_queue
            .commandBuffer()
            .ok_or_else(|| "Failed to create command buffer".to_string())?;

        let label = NSString::from_str("Mesh Render Pass");
        command_buffer.setLabel(Some(&label));

        let position = camera.position();
        let uniforms = FrameUniforms {
            view_projection: camera.view_projection_matrix(),
            camera_position: [position.x, position.y, position.z, 1.0],
            time,
            _padding: [0.0; 3],
        };
        // Safety: the uniform buffer was created with exactly sizeof(FrameUniforms) bytes.
        unsafe {
            let contents = self.uniform_buffer.contents();
            std::ptr::copy_nonoverlapping(
                &raw const uniforms,
                contents.as_ptr().cast::<FrameUniforms>(),
                1,
            );
        }

        let render_pass_descriptor = unsafe { MTLRenderPassDescriptor::new() };
        let color_attachment = unsafe {
            render_pass_descriptor
                .colorAttachments()
                .objectAtIndexedSubscript(0)
        };

        unsafe {
            color_attachment.setTexture(Some(&drawable.texture()));
            color_attachment.setLoadAction(MTLLoadAction::Clear);
            color_attachment.setClearColor(MTLClearColor {
                red: 0.2,
                green: 0.3,
                blue: 0.4,
                alpha: 1.0,
            });
            color_attachment.setStoreAction(MTLStoreAction::Store);
        }

        if let Some(depth_texture) = &self.depth_texture {
            let depth_attachment = render_pass_descriptor.depthAttachment();
            depth_attachment.setTexture(Some(depth_texture));
            depth_attachment.setLoadAction(MTLLoadAction::Clear);
            depth_attachment.setClearDepth(1.0);
            depth_attachment.setStoreAction(MTLStoreAction::DontCare);
        }

        if let Some(render_encoder) =
            command_buffer.renderCommandEncoderWithDescriptor(&render_pass_descriptor)
        {
            let label = NSString::from_str("Mesh Encoder");
            render_encoder.setLabel(Some(&label));

            unsafe {
                render_encoder.setVertexBuffer_offset_atIndex(Some(&self.vertex_buffer), 0, 0);
                render_encoder.setVertexBuffer_offset_atIndex(
                    Some(&self.uniform_buffer),
                    0,
                    FRAME_BUFFER_INDEX,
                );
                render_encoder.setFragmentBuffer_offset_atIndex(
                    Some(&self.uniform_buffer),
                    0,
                    FRAME_BUFFER_INDEX,
                );
                render_encoder.setFragmentSamplerState_atIndex(Some(&self.sampler_state), 0);
            }

            // Opaque batches first so translucent ones blend over them.
            for translucent in [false, true] {
                if translucent {
                    render_encoder.setRenderPipelineState(&self.blended_pipeline_state);
                    render_encoder
                        .setDepthStencilState(Some(&self.translucent_depth_stencil_state));
                } else {
                    render_encoder.setRenderPipelineState(&self.opaque_pipeline_state);
                    render_encoder.setDepthStencilState(Some(&self.depth_stencil_state));
                }

                for batch in self.batches.iter().filter(|b| b.translucent == translucent) {
                    self.encode_batch(&render_encoder, &batch.submesh);
                }
            }

            render_encoder.endEncoding();
        }

        // Safety: CAMetalDrawable conforms to MTLDrawable.
        unsafe {
            let mtl_drawable = (&raw const *drawable).cast::<ProtocolObject<dyn MTLDrawable>>();
            command_buffer.presentDrawable(&*mtl_drawable);
        }

        command_buffer.commit();

        Ok(())
    }

    fn encode_batch(
        &self,
        render_encoder: &ProtocolObject<dyn MTLRenderCommandEncoder>,
        submesh: &Submesh,
    ) {
        let material_index = submesh.material_index as usize;
        let Some(texture) = self.material_textures.get(material_index) else {
            return;
        };

        let material_offset = material_index * std::mem::size_of::<GpuMaterial>();
        let index_offset = submesh.index_offset as usize * std::mem::size_of::<u32>();

        unsafe {
            render_encoder.setFragmentBuffer_offset_atIndex(
                Some(&self.material_buffer),
                material_offset,
                MATERIAL_BUFFER_INDEX,
            );
            render_encoder.setFragmentTexture_atIndex(Some(texture), 0);

            render_encoder.drawIndexedPrimitives_indexCount_indexType_indexBuffer_indexBufferOffset(
                MTLPrimitiveType::Triangle,
                submesh.index_count as usize,
                MTLIndexType::UInt32,
                &self.index_buffer,
                index_offset,
            );
        }
    }

    fn set_layer_size(&self, width: u32, height: u32) {
        let size = CGSize {
            width: f64::from(width),
            height: f64::from(height),
        };
        unsafe {
            self.layer.setDrawableSize(size);
        }
    }

    pub fn update_drawable_size(&mut self, width: u32, height: u32) {
        self.drawable_size = (width, height);
        self.set_layer_size(width, height);

        match Self::create_depth_texture(&self.device, width, height) {
            Ok(depth_texture) => self.depth_texture = Some(depth_texture),
            Err(e) => warn!("{e}"),
        }
    }

    pub fn drawable_size(&self) -> (u32, u32) {
        self.drawable_size
    }
}
