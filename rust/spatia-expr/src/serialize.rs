// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.
use std::collections::BTreeMap;

use datafusion_common::{DataFusionError, Result};
use spatia_geometry::error::SpatiaGeometryError;

/// Property id that terminates a serialized property stream
///
/// Field ids start at 1; id 0 is never written as a regular property.
pub const STOP_PROPERTY_ID: u16 = 0;

/// A value that can be stored as the payload of a property
pub trait PropertyValue: Sized + PartialEq {
    fn encode(&self, out: &mut Vec<u8>);

    /// Decode a payload, returning `None` if it has the wrong size
    fn decode(bytes: &[u8]) -> Option<Self>;
}

macro_rules! le_property_value {
    ($($t:ty),*) => {
        $(
            impl PropertyValue for $t {
                fn encode(&self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn decode(bytes: &[u8]) -> Option<Self> {
                    Some(<$t>::from_le_bytes(bytes.try_into().ok()?))
                }
            }
        )*
    };
}

le_property_value!(u32, u64, f64);

impl PropertyValue for bool {
    fn encode(&self, out: &mut Vec<u8>) {
        out.push(*self as u8);
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [0] => Some(false),
            [1] => Some(true),
            _ => None,
        }
    }
}

/// Writes values keyed by stable numeric field ids
///
/// Field ids, not field order, identify a value. Readers skip ids they do not
/// know about and fall back to defaults for ids that are absent, which lets
/// older and newer writers share one format.
pub trait PropertySerializer {
    fn write_property<T: PropertyValue>(
        &mut self,
        field_id: u16,
        name: &'static str,
        value: &T,
    ) -> Result<()>;

    /// Write a property unless it equals its type's default
    fn write_property_with_default<T: PropertyValue + Default>(
        &mut self,
        field_id: u16,
        name: &'static str,
        value: &T,
    ) -> Result<()> {
        if *value == T::default() {
            return Ok(());
        }

        self.write_property(field_id, name, value)
    }
}

/// Reads values written by a [PropertySerializer]
pub trait PropertyDeserializer {
    /// Read a property that must be present
    fn read_property<T: PropertyValue>(&mut self, field_id: u16, name: &'static str)
        -> Result<T>;

    /// Read a property, returning the type's default if it is absent
    fn read_property_with_default<T: PropertyValue + Default>(
        &mut self,
        field_id: u16,
        name: &'static str,
    ) -> Result<T>;
}

/// Compact binary [PropertySerializer]
///
/// Each property is a little endian `u16` field id, a `u32` payload length and the
/// payload. The stream ends with [STOP_PROPERTY_ID].
#[derive(Debug, Default)]
pub struct BinarySerializer {
    buf: Vec<u8>,
}

impl BinarySerializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Terminate the stream and return its bytes
    pub fn finish(mut self) -> Vec<u8> {
        self.buf.extend_from_slice(&STOP_PROPERTY_ID.to_le_bytes());
        self.buf
    }
}

impl PropertySerializer for BinarySerializer {
    fn write_property<T: PropertyValue>(
        &mut self,
        field_id: u16,
        name: &'static str,
        value: &T,
    ) -> Result<()> {
        if field_id == STOP_PROPERTY_ID {
            return Err(serialization_err(format!(
                "Property '{name}' uses reserved field id {field_id}"
            )));
        }

        let mut payload = Vec::new();
        value.encode(&mut payload);
        let len = u32::try_from(payload.len())
            .map_err(|_| serialization_err(format!("Property '{name}' is too large")))?;

        self.buf.extend_from_slice(&field_id.to_le_bytes());
        self.buf.extend_from_slice(&len.to_le_bytes());
        self.buf.extend_from_slice(&payload);
        Ok(())
    }
}

/// Reader for streams produced by [BinarySerializer]
///
/// The whole stream is indexed up front so properties may be read in any order.
/// Properties that are never read are ignored.
#[derive(Debug)]
pub struct BinaryDeserializer<'a> {
    properties: BTreeMap<u16, &'a [u8]>,
}

impl<'a> BinaryDeserializer<'a> {
    pub fn try_new(buf: &'a [u8]) -> Result<Self> {
        let mut properties = BTreeMap::new();
        let mut remaining = buf;

        loop {
            let (id_bytes, rest) = split(remaining, 2)?;
            let field_id = u16::from_le_bytes([id_bytes[0], id_bytes[1]]);
            remaining = rest;

            if field_id == STOP_PROPERTY_ID {
                break;
            }

            let (len_bytes, rest) = split(remaining, 4)?;
            let len = u32::from_le_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]);
            let (payload, rest) = split(rest, len as usize)?;
            remaining = rest;

            if properties.insert(field_id, payload).is_some() {
                return Err(serialization_err(format!(
                    "Duplicate property with field id {field_id}"
                )));
            }
        }

        if !remaining.is_empty() {
            return Err(serialization_err(format!(
                "Unexpected {} bytes after end of properties",
                remaining.len()
            )));
        }

        Ok(Self { properties })
    }

    fn decode<T: PropertyValue>(&self, field_id: u16, name: &'static str) -> Result<Option<T>> {
        match self.properties.get(&field_id) {
            Some(payload) => T::decode(payload).map(Some).ok_or_else(|| {
                serialization_err(format!(
                    "Property '{name}' ({field_id}) has unexpected size {}",
                    payload.len()
                ))
            }),
            None => Ok(None),
        }
    }
}

impl PropertyDeserializer for BinaryDeserializer<'_> {
    fn read_property<T: PropertyValue>(
        &mut self,
        field_id: u16,
        name: &'static str,
    ) -> Result<T> {
        self.decode(field_id, name)?.ok_or_else(|| {
            serialization_err(format!("Missing required property '{name}' ({field_id})"))
        })
    }

    fn read_property_with_default<T: PropertyValue + Default>(
        &mut self,
        field_id: u16,
        name: &'static str,
    ) -> Result<T> {
        Ok(self.decode(field_id, name)?.unwrap_or_default())
    }
}

fn split(buf: &[u8], n: usize) -> Result<(&[u8], &[u8])> {
    if buf.len() < n {
        return Err(serialization_err(format!(
            "Unexpected end of properties: needed {n} bytes but {} remain",
            buf.len()
        )));
    }

    Ok(buf.split_at(n))
}

pub(crate) fn serialization_err(message: String) -> DataFusionError {
    DataFusionError::External(Box::new(SpatiaGeometryError::Serialization(message)))
}
