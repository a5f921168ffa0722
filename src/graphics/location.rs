use std::collections::HashMap;

use log::warn;

use super::{error::ShaderError, gfx::{to_cstring, GlBackend, ProgramHandle}, uniform::UniformKind};

/// Driver-assigned slot of a named attribute or uniform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Location(i32);

impl Location {
    /// The name was optimized out of the program or never declared.
    pub const UNRESOLVED: Location = Location(-1);

    pub fn new(raw: i32) -> Location {
        if raw < 0 { Location::UNRESOLVED } else { Location(raw) }
    }

    pub fn is_resolved(self: &Self) -> bool {
        self.0 >= 0
    }

    pub fn raw(self: &Self) -> i32 {
        self.0
    }

    /// Attribute index, for the vertex array calls that take unsigned slots.
    pub fn index(self: &Self) -> Option<u32> {
        if self.is_resolved() { Some(self.0 as u32) } else { None }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttribDecl {
    pub name: &'static str,
    /// Float components per vertex (2 for vec2, 4 for vec4, ...)
    pub components: i32,
}

impl AttribDecl {
    pub const fn new(name: &'static str, components: i32) -> AttribDecl {
        AttribDecl { name, components }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniformDecl {
    pub name: &'static str,
    pub kind: UniformKind,
    /// 0 for a plain uniform, otherwise the element count of a uniform array.
    pub array_len: usize,
}

impl UniformDecl {
    pub const fn new(name: &'static str, kind: UniformKind) -> UniformDecl {
        UniformDecl { name, kind, array_len: 0 }
    }

    pub const fn array(name: &'static str, kind: UniformKind, array_len: usize) -> UniformDecl {
        UniformDecl { name, kind, array_len }
    }

    /// Names the driver is queried with: `name`, or `name[0]`..`name[n-1]`.
    pub fn expanded_names(self: &Self) -> Vec<String> {
        if self.array_len == 0 {
            vec![self.name.to_owned()]
        }
        else {
            (0..self.array_len).map(|i| element_name(self.name, i)).collect()
        }
    }
}

pub fn element_name(name: &str, index: usize) -> String {
    format!("{}[{}]", name, index)
}

#[derive(Clone, Copy, Debug)]
struct ResolvedAttrib {
    name: &'static str,
    location: Location,
    components: i32,
}

/// Locations of every semantic name a flavor declares, resolved once per
/// successful link.
#[derive(Clone, Debug, Default)]
pub struct LocationTable {
    attributes: Vec<ResolvedAttrib>,
    uniforms: HashMap<String, (Location, UniformKind)>,
}

impl LocationTable {
    pub fn resolve<G: GlBackend + ?Sized>(gl: &G, program: ProgramHandle, attributes: &[AttribDecl], uniforms: &[UniformDecl]) -> Result<LocationTable, ShaderError> {
        let mut table = LocationTable::default();

        for decl in attributes {
            let name = to_cstring(decl.name)?;
            let location = Location::new(gl.attrib_location(program.get(), &name));
            if !location.is_resolved() {
                warn!("Warning: cannot get location of {}", decl.name);
            }

            table.attributes.push(ResolvedAttrib { name: decl.name, location, components: decl.components });
        }

        for decl in uniforms {
            for name in decl.expanded_names() {
                let cname = to_cstring(&name)?;
                let location = Location::new(gl.uniform_location(program.get(), &cname));
                if !location.is_resolved() {
                    warn!("Warning: cannot get location of {}", name);
                }

                table.uniforms.insert(name, (location, decl.kind));
            }
        }

        Ok(table)
    }

    pub fn attribute(self: &Self, name: &str) -> Location {
        self.attributes.iter()
            .find(|a| a.name == name)
            .map(|a| a.location)
            .unwrap_or(Location::UNRESOLVED)
    }

    pub fn attribute_components(self: &Self, name: &str) -> Option<i32> {
        self.attributes.iter().find(|a| a.name == name).map(|a| a.components)
    }

    /// Resolved attribute slots in declaration order.
    pub fn attribute_indices(self: &Self) -> impl Iterator<Item = u32> + '_ {
        self.attributes.iter().filter_map(|a| a.location.index())
    }

    pub fn uniform(self: &Self, name: &str) -> Location {
        self.uniforms.get(name).map(|u| u.0).unwrap_or(Location::UNRESOLVED)
    }

    pub fn uniform_kind(self: &Self, name: &str) -> Option<UniformKind> {
        self.uniforms.get(name).map(|u| u.1)
    }

    /// Declared names the driver could not locate, sorted.
    pub fn unresolved(self: &Self) -> Vec<String> {
        let mut names = self.attributes.iter()
            .filter(|a| !a.location.is_resolved())
            .map(|a| a.name.to_owned())
            .chain(self.uniforms.iter().filter(|(_, u)| !u.0.is_resolved()).map(|(n, _)| n.clone()))
            .collect::<Vec<_>>();
        names.sort();
        names
    }

    pub fn is_empty(self: &Self) -> bool {
        self.attributes.is_empty() && self.uniforms.is_empty()
    }
}
