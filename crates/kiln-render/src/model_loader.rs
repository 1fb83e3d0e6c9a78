//! Wavefront OBJ/MTL loading
//!
//! Supports the subset the sandbox models use: `v`, `vt`, `vn`, triangle
//! `f` records with `v/vt/vn` or `v//vn` corners, and `mtllib` whose
//! `map_Kd` names the diffuse texture. Texture V is flipped to a top-left
//! origin and each triangle's winding is reversed for a clockwise-front
//! rasterizer.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::primitives::Vertex;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{file}:{line}: {message}")]
    Parse {
        file: String,
        line: usize,
        message: String,
    },
}

/// Flattened triangle list plus the diffuse texture, if the material names one
#[derive(Debug, Clone, Default)]
pub struct ModelData {
    pub vertices: Vec<Vertex>,
    pub texture_path: Option<PathBuf>,
}

/// Load `directory/filename` and its material library.
pub fn load_obj(directory: &Path, filename: &str) -> Result<ModelData, ModelError> {
    let path = directory.join(filename);
    let source = std::fs::read_to_string(&path).map_err(|source| ModelError::Io {
        path: path.clone(),
        source,
    })?;

    let parsed = parse_obj(&source, filename)?;
    let texture_path = match parsed.material_library {
        Some(mtl_name) => {
            let mtl_path = directory.join(&mtl_name);
            let mtl_source = std::fs::read_to_string(&mtl_path).map_err(|source| ModelError::Io {
                path: mtl_path.clone(),
                source,
            })?;
            parse_mtl(&mtl_source).map(|texture| directory.join(texture))
        }
        None => None,
    };

    log::info!(
        "loaded model {} ({} vertices)",
        path.display(),
        parsed.vertices.len()
    );
    Ok(ModelData {
        vertices: parsed.vertices,
        texture_path,
    })
}

/// Result of parsing an OBJ source, before the material library is read
#[derive(Debug, Clone, Default)]
pub struct ParsedObj {
    pub vertices: Vec<Vertex>,
    pub material_library: Option<String>,
}

pub fn parse_obj(source: &str, file: &str) -> Result<ParsedObj, ModelError> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut texcoords: Vec<[f32; 2]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();
    let mut parsed = ParsedObj::default();

    for (index, raw) in source.lines().enumerate() {
        let line_no = index + 1;
        let err = |message: String| ModelError::Parse {
            file: file.to_string(),
            line: line_no,
            message,
        };

        let mut tokens = raw.split_whitespace();
        let Some(identifier) = tokens.next() else {
            continue;
        };

        match identifier {
            "v" => positions.push(parse_floats::<3>(&mut tokens).map_err(err)?),
            "vt" => texcoords.push(parse_floats::<2>(&mut tokens).map_err(err)?),
            "vn" => normals.push(parse_floats::<3>(&mut tokens).map_err(err)?),
            "f" => {
                let corners: Vec<&str> = tokens.collect();
                if corners.len() != 3 {
                    return Err(err(format!(
                        "only triangles are supported, face has {} corners",
                        corners.len()
                    )));
                }
                let mut triangle = [Vertex::new([0.0; 3], [0.0; 2], [0.0; 3]); 3];
                for (slot, corner) in triangle.iter_mut().zip(&corners) {
                    *slot = resolve_corner(corner, &positions, &texcoords, &normals).map_err(err)?;
                }
                parsed.vertices.extend([triangle[2], triangle[1], triangle[0]]);
            }
            "mtllib" => {
                let name = tokens
                    .next()
                    .ok_or_else(|| err("mtllib without a file name".to_string()))?;
                parsed.material_library = Some(name.to_string());
            }
            _ => {}
        }
    }

    Ok(parsed)
}

/// The diffuse texture path (`map_Kd`) of a material library, if any
pub fn parse_mtl(source: &str) -> Option<String> {
    source.lines().find_map(|line| {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("map_Kd") => tokens.last().map(str::to_string),
            _ => None,
        }
    })
}

fn parse_floats<'a, const N: usize>(
    tokens: &mut impl Iterator<Item = &'a str>,
) -> Result<[f32; N], String> {
    let mut out = [0.0; N];
    for value in out.iter_mut() {
        let token = tokens
            .next()
            .ok_or_else(|| format!("expected {N} components"))?;
        *value = token
            .parse()
            .map_err(|_| format!("invalid number '{token}'"))?;
    }
    Ok(out)
}

fn resolve_corner(
    corner: &str,
    positions: &[[f32; 3]],
    texcoords: &[[f32; 2]],
    normals: &[[f32; 3]],
) -> Result<Vertex, String> {
    let mut parts = corner.split('/');
    let position = lookup(parts.next(), positions, "position", corner)?
        .ok_or_else(|| format!("corner '{corner}' has no position"))?;
    let texcoord = lookup(parts.next(), texcoords, "texcoord", corner)?.unwrap_or([0.0, 0.0]);
    let normal = lookup(parts.next(), normals, "normal", corner)?
        .ok_or_else(|| format!("corner '{corner}' has no normal"))?;

    Ok(Vertex::new(position, [texcoord[0], 1.0 - texcoord[1]], normal))
}

/// 1-based OBJ index lookup; an empty field yields `None`.
fn lookup<T: Copy>(
    field: Option<&str>,
    items: &[T],
    kind: &str,
    corner: &str,
) -> Result<Option<T>, String> {
    let Some(field) = field.filter(|f| !f.is_empty()) else {
        return Ok(None);
    };
    let index: usize = field
        .parse()
        .map_err(|_| format!("invalid {kind} index in '{corner}'"))?;
    index
        .checked_sub(1)
        .and_then(|i| items.get(i))
        .copied()
        .map(Some)
        .ok_or_else(|| format!("{kind} index {index} out of range in '{corner}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "\
# one triangle
mtllib plane.mtl
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.25
vt 0.0 1.0
vn 0.0 0.0 1.0
f 1/1/1 2/2/1 3/3/1
";

    #[test]
    fn triangle_is_reversed_and_v_flipped() {
        let parsed = parse_obj(TRIANGLE, "tri.obj").unwrap();
        assert_eq!(parsed.material_library.as_deref(), Some("plane.mtl"));
        assert_eq!(parsed.vertices.len(), 3);

        // stored as corner 3, 2, 1
        assert_eq!(parsed.vertices[0].position, [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(parsed.vertices[1].position, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(parsed.vertices[2].position, [0.0, 0.0, 0.0, 1.0]);

        assert_eq!(parsed.vertices[0].texcoord, [0.0, 0.0]);
        assert_eq!(parsed.vertices[1].texcoord, [1.0, 0.75]);
        assert_eq!(parsed.vertices[2].texcoord, [0.0, 1.0]);
        assert_eq!(parsed.vertices[0].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn missing_texcoord_defaults() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n";
        let parsed = parse_obj(src, "notex.obj").unwrap();
        assert_eq!(parsed.vertices.len(), 3);
        assert_eq!(parsed.vertices[0].texcoord, [0.0, 1.0]);
    }

    #[test]
    fn quads_are_rejected_with_line_number() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\nvn 0 0 1\nf 1//1 2//1 4//1 3//1\n";
        let err = parse_obj(src, "quad.obj").unwrap_err();
        match err {
            ModelError::Parse { line, file, .. } => {
                assert_eq!(line, 6);
                assert_eq!(file, "quad.obj");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let src = "v 0 0 0\nvn 0 0 1\nf 1//1 2//1 1//1\n";
        let err = parse_obj(src, "bad.obj").unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn bad_number_is_an_error() {
        let err = parse_obj("v 0 zero 0\n", "bad.obj").unwrap_err();
        assert!(err.to_string().contains("bad.obj:1"));
    }

    #[test]
    fn mtl_diffuse_map() {
        let mtl = "newmtl Material\nKd 1 1 1\nmap_Kd uvChecker.png\n";
        assert_eq!(parse_mtl(mtl).as_deref(), Some("uvChecker.png"));
        assert_eq!(parse_mtl("newmtl Empty\n"), None);
    }

    #[test]
    fn load_from_disk_resolves_texture_next_to_model() {
        let dir = std::env::temp_dir().join(format!("kiln-obj-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("tri.obj"), TRIANGLE).unwrap();
        std::fs::write(dir.join("plane.mtl"), "map_Kd checker.png\n").unwrap();

        let model = load_obj(&dir, "tri.obj").unwrap();
        assert_eq!(model.vertices.len(), 3);
        assert_eq!(model.texture_path, Some(dir.join("checker.png")));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_obj(Path::new("/nonexistent-kiln"), "none.obj").unwrap_err();
        assert!(matches!(err, ModelError::Io { .. }));
    }
}
