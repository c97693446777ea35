//! Part shaders
//!
//! Unlit base color (texture or the white fallback), with a soft headlight
//! term when the part carries normals.

pub mod vs {
    vulkano_shaders::shader! {
        ty: "vertex",
        src: r"
            #version 450

            layout(location = 0) in vec3 position;
            layout(location = 1) in vec3 normal;
            layout(location = 2) in vec2 uv;

            layout(location = 0) out vec3 v_normal;
            layout(location = 1) out vec2 v_uv;

            layout(push_constant) uniform PushConstants {
                mat4 mvp;
                mat4 normal_matrix;
            } pc;

            void main() {
                gl_Position = pc.mvp * vec4(position, 1.0);
                gl_PointSize = 3.0;
                v_normal = mat3(pc.normal_matrix) * normal;
                v_uv = uv;
            }
        ",
    }
}

pub mod fs {
    vulkano_shaders::shader! {
        ty: "fragment",
        src: r"
            #version 450

            layout(location = 0) in vec3 v_normal;
            layout(location = 1) in vec2 v_uv;

            layout(location = 0) out vec4 f_color;

            layout(set = 0, binding = 0) uniform sampler2D base_color;

            void main() {
                vec4 color = texture(base_color, v_uv);
                float shade = 1.0;
                // Zero normals come from the fallback stream.
                if (dot(v_normal, v_normal) > 0.01) {
                    shade = 0.65 + 0.35 * max(normalize(v_normal).z, 0.0);
                }
                f_color = vec4(color.rgb * shade, color.a);
            }
        ",
    }
}
