use std::collections::HashSet;

use anyhow::{anyhow, bail, Context, Result};
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::math::{Matrix4, Vector3};

/// Avatar description: a bone hierarchy plus the scripts that animate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Rig {
    /// Bones in depth-first document order; parents precede children.
    pub bones: Vec<Bone>,
    pub scripts: Vec<ScriptSource>,
}

/// Lua source bundled with an avatar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptSource {
    pub name: String,
    pub source: String,
}

/// Single bone with its local transform parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bone {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub pivot: Vector3,
    #[serde(default)]
    pub position: Vector3,
    /// Euler angles in degrees, applied X, then Y, then Z.
    #[serde(default)]
    pub rotation: Vector3,
    #[serde(default = "default_scale")]
    pub scale: Vector3,
}

impl Default for Bone {
    fn default() -> Self {
        Self {
            name: String::new(),
            parent: None,
            pivot: Vector3::zero(),
            position: Vector3::zero(),
            rotation: Vector3::zero(),
            scale: default_scale(),
        }
    }
}

fn default_scale() -> Vector3 {
    Vector3::splat(1.0)
}

impl Bone {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Writes the local transform into `out`:
    /// un-pivot, scale, rotate ZYX, then move to `pivot + position`.
    pub fn write_local_matrix(&self, out: &mut Matrix4) {
        let pivot = self.pivot;
        let offset = pivot + self.position;
        out.reset()
            .translate(-pivot.x(), -pivot.y(), -pivot.z())
            .scale(self.scale.x(), self.scale.y(), self.scale.z())
            .rotate_zyx(self.rotation.x(), self.rotation.y(), self.rotation.z())
            .translate(offset.x(), offset.y(), offset.z());
    }

    pub fn local_matrix(&self) -> Matrix4 {
        let mut matrix = Matrix4::identity();
        self.write_local_matrix(&mut matrix);
        matrix
    }
}

impl Rig {
    /// Parses an `<avatar>` document.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid avatar XML")?;
        let root = document.root_element();
        if !root.has_tag_name("avatar") {
            bail!("expected <avatar> root, found <{}>", root.tag_name().name());
        }

        let mut bones = Vec::new();
        collect_bones(root, None, &mut bones)?;

        let mut seen = HashSet::new();
        for bone in &bones {
            if !seen.insert(bone.name.as_str()) {
                bail!("duplicate bone name {:?}", bone.name);
            }
        }

        let scripts = root
            .children()
            .filter(|child| child.has_tag_name("script"))
            .map(|node| {
                let name = node
                    .attribute("name")
                    .ok_or_else(|| anyhow!("<script> is missing a name attribute"))?;
                Ok(ScriptSource {
                    name: name.to_string(),
                    source: node.text().unwrap_or_default().to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { bones, scripts })
    }

    pub fn bone(&self, name: &str) -> Option<&Bone> {
        self.bones.iter().find(|bone| bone.name == name)
    }
}

fn collect_bones(node: Node<'_, '_>, parent: Option<&str>, out: &mut Vec<Bone>) -> Result<()> {
    for child in node.children().filter(|child| child.has_tag_name("bone")) {
        let name = child
            .attribute("name")
            .filter(|name| !name.is_empty())
            .ok_or_else(|| anyhow!("<bone> is missing a name attribute"))?;
        let mut bone = Bone::new(name);
        bone.parent = parent.map(str::to_string);
        bone.pivot = parse_vec3(optional_text(&child, "pivot"), bone.pivot)
            .with_context(|| format!("bone {name}: bad <pivot>"))?;
        bone.position = parse_vec3(optional_text(&child, "position"), bone.position)
            .with_context(|| format!("bone {name}: bad <position>"))?;
        bone.rotation = parse_vec3(optional_text(&child, "rotation"), bone.rotation)
            .with_context(|| format!("bone {name}: bad <rotation>"))?;
        bone.scale = parse_vec3(optional_text(&child, "scale"), bone.scale)
            .with_context(|| format!("bone {name}: bad <scale>"))?;
        out.push(bone);
        collect_bones(child, Some(name), out)?;
    }
    Ok(())
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_vec3(value: Option<String>, default: Vector3) -> Result<Vector3> {
    let Some(value) = value else {
        return Ok(default);
    };
    let numbers = value
        .split_whitespace()
        .map(|component| {
            component
                .parse::<f64>()
                .map_err(|err| anyhow!("failed to parse {component:?}: {err}"))
        })
        .collect::<Result<Vec<_>>>()?;
    Vector3::from_slice(&numbers).map_err(|err| anyhow!("vector needs 3 components: {err}"))
}
