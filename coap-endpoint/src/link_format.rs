// Copyright 2019 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! A minimal link-format renderer for `.well-known/core` (§4.11): writes a
//! comma-separated `</path>` list of every registered resource into a
//! caller-supplied buffer. Deliberately does not support `rt=`/`if=`/`sz=`
//! attributes — nothing in this engine's tested behavior needs them.

use crate::error::Error;
use crate::resource::ResourceRegistry;
use std::io::Write;

/// Percent-escapes the handful of characters link-format reserves inside a path
/// segment (`,`, `;`, `"`, `<`, `>`), leaving everything else (including `/`)
/// untouched.
fn write_escaped(out: &mut impl Write, path: &str) -> Result<(), Error> {
    for ch in path.chars() {
        match ch {
            ',' | ';' | '"' | '<' | '>' => write!(out, "%{:02X}", ch as u32).map_err(|_| Error::OutOfSpace)?,
            _ => write!(out, "{}", ch).map_err(|_| Error::OutOfSpace)?,
        }
    }
    Ok(())
}

/// Renders `registry` into `buffer`, returning the number of bytes written.
/// Fails with [`Error::OutOfSpace`] if the buffer is too small for the full
/// rendering — this renderer does not truncate.
pub fn print_wellknown(registry: &ResourceRegistry, buffer: &mut [u8]) -> Result<usize, Error> {
    let mut cursor = std::io::Cursor::new(buffer);
    let mut first = true;

    for resource in registry.iter() {
        if !first {
            write!(cursor, ",").map_err(|_| Error::OutOfSpace)?;
        }
        first = false;

        write!(cursor, "<").map_err(|_| Error::OutOfSpace)?;
        write!(cursor, "/").map_err(|_| Error::OutOfSpace)?;
        write_escaped(&mut cursor, resource.path().trim_start_matches('/'))?;
        write!(cursor, ">").map_err(|_| Error::OutOfSpace)?;
    }

    Ok(cursor.position() as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Resource;

    #[test]
    fn renders_registered_paths_as_link_format() {
        let mut registry = ResourceRegistry::new();
        registry.register(Resource::new("a"));
        registry.register(Resource::new("sensors/temp"));

        let mut buf = [0u8; 64];
        let n = print_wellknown(&registry, &mut buf).unwrap();
        let rendered = std::str::from_utf8(&buf[..n]).unwrap();

        assert_eq!(rendered, "</a>,</sensors/temp>");
    }

    #[test]
    fn empty_registry_renders_empty_string() {
        let registry = ResourceRegistry::new();
        let mut buf = [0u8; 16];
        let n = print_wellknown(&registry, &mut buf).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn buffer_too_small_errors() {
        let mut registry = ResourceRegistry::new();
        registry.register(Resource::new("a-very-long-resource-path"));

        let mut buf = [0u8; 4];
        assert!(print_wellknown(&registry, &mut buf).is_err());
    }

    #[test]
    fn reserved_characters_are_percent_escaped() {
        let mut registry = ResourceRegistry::new();
        registry.register(Resource::new("a,b"));

        let mut buf = [0u8; 32];
        let n = print_wellknown(&registry, &mut buf).unwrap();
        let rendered = std::str::from_utf8(&buf[..n]).unwrap();
        assert_eq!(rendered, "</a%2Cb>");
    }
}
