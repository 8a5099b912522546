use alloc::collections::VecDeque;
use alloc::rc::{Rc, Weak};
use alloc::string::ToString;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::RefCell;

use byteorder::{LittleEndian, ReadBytesExt};
use gr_utils::hash::HashMap;
use std::io::{Read, Seek, SeekFrom};

use crate::de::lazy::{LazyResolver, LazyValue, TypeRef};
use crate::de::LoadContext;
use crate::registry::TypeRegistry;
use crate::repo::{Codec, DetectEnv, TypeRepo, detect, inline_codec};
use crate::schema::{Category, StoredType, TypeDesc};
use crate::value::{ObjRef, ObjectState, Slot, Value};
use crate::wire::{DataReader, FORMAT_VERSION, MAGIC, RefTag};
use crate::{SerialError, SerializerOptions, SessionState, Warning, WarningKind};

/// A root as listed in the root section.
enum Root {
    Value(Value),
    Object(TypeRef),
}

/// Where a reference points, before anything is allocated for it.
enum Target {
    Null,
    Value(Value),
    Object(TypeRef),
}

/// State of one open stream.
///
/// Schema, header and root sections are read when the session opens. Object
/// payloads are read from the data section on demand, each one from its own
/// region.
pub(crate) struct LoadSession<R> {
    reader: R,
    registry: TypeRegistry,
    pub options: SerializerOptions,
    /// Stream position of the data section.
    data_start: u64,
    repos: Vec<TypeRepo>,
    index: HashMap<TypeDesc, u16>,
    roots: Vec<Root>,
    queue: VecDeque<TypeRef>,
    /// Identity of each allocated object to its location in the stream.
    located: HashMap<usize, TypeRef>,
    pub warnings: Vec<Warning>,
    pub state: SessionState,
    /// Objects of resolved types in the stream.
    total: u64,
    hydrated: u64,
    this: Weak<RefCell<dyn LazyResolver>>,
}

fn read_section<R: Read>(reader: &mut R) -> Result<Vec<u8>, SerialError> {
    let len = reader.read_u32::<LittleEndian>()? as usize;
    let mut bytes = Vec::new();
    reader.by_ref().take(len as u64).read_to_end(&mut bytes)?;
    if bytes.len() != len {
        return Err(SerialError::OutOfBounds {
            requested: len,
            remaining: bytes.len(),
        });
    }
    Ok(bytes)
}

impl<R: Read + Seek + 'static> LoadSession<R> {
    /// Reads everything but the data section and returns the shared session.
    pub fn open(
        registry: &TypeRegistry,
        mut reader: R,
        options: SerializerOptions,
    ) -> Result<Rc<RefCell<Self>>, SerialError> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(SerialError::BadMagic(magic));
        }
        let version = reader.read_u16::<LittleEndian>()?;
        if version != FORMAT_VERSION {
            return Err(SerialError::UnsupportedVersion(version));
        }

        let empty: Weak<RefCell<dyn LazyResolver>> = Weak::<RefCell<Self>>::new();
        let mut session = Self {
            reader,
            registry: registry.clone(),
            options,
            data_start: 0,
            repos: Vec::new(),
            index: HashMap::default(),
            roots: Vec::new(),
            queue: VecDeque::new(),
            located: HashMap::default(),
            warnings: Vec::new(),
            state: SessionState::ReadingSchema,
            total: 0,
            hydrated: 0,
            this: empty,
        };

        let schema = read_section(&mut session.reader)?;
        let stored = session.read_schema(&schema)?;

        session.state = SessionState::ReadingHeaders;
        let header = read_section(&mut session.reader)?;
        session.read_headers(&header, &stored)?;
        let roots = read_section(&mut session.reader)?;
        session.read_roots(&roots)?;
        session.data_start = session.reader.stream_position()?;

        log::debug!(
            "opened stream: {} types, {} roots, {} objects",
            session.repos.len(),
            session.roots.len(),
            session.total
        );
        session.update_state();

        let shared = Rc::new(RefCell::new(session));
        let weak: Weak<RefCell<Self>> = Rc::downgrade(&shared);
        shared.borrow_mut().this = weak;
        Ok(shared)
    }

    fn read_schema(&mut self, bytes: &[u8]) -> Result<Vec<StoredType>, SerialError> {
        let mut r = DataReader::new(bytes);
        let count = r.read_u16()? as usize;
        let mut stored = Vec::with_capacity(count.min(r.remaining()));

        for type_index in 0..count {
            let record = StoredType::decode(&mut r)?;
            let detected = detect(
                &record.desc,
                &mut DetectEnv {
                    registry: &self.registry,
                    options: self.options,
                    stored: Some(&record),
                    warnings: &mut self.warnings,
                },
            );
            if self.index.insert(record.desc.clone(), type_index as u16).is_some() {
                return Err(SerialError::corrupt("type listed twice in the schema section"));
            }
            log::trace!(
                "type {type_index}: `{}` stored as {} ({:?}), read as {}",
                record.desc,
                record.category,
                record.flags,
                detected.schema.category()
            );
            self.repos.push(TypeRepo::new(detected));
            stored.push(record);
        }
        Ok(stored)
    }

    fn read_headers(&mut self, bytes: &[u8], stored: &[StoredType]) -> Result<(), SerialError> {
        let mut r = DataReader::new(bytes);
        let mut region_start = 0u64;

        for (repo, record) in self.repos.iter_mut().zip(stored) {
            let data_size = r.read_u64()?;
            let count = record.num_objects as usize;
            let needed = count.saturating_mul(4);
            if needed > r.remaining() {
                return Err(SerialError::OutOfBounds {
                    requested: needed,
                    remaining: r.remaining(),
                });
            }

            let mut offset = 0u64;
            repo.sizes = Vec::with_capacity(count);
            repo.offsets = Vec::with_capacity(count);
            for _ in 0..count {
                let size = r.read_u32()?;
                repo.offsets.push(offset);
                repo.sizes.push(size);
                offset += size as u64;
            }

            if repo.schema.resolved() {
                repo.codec.read_custom_header(record.num_objects, &mut r)?;
                self.total += record.num_objects as u64;
            } else if record.category == Category::Bytes {
                r.take(needed)?;
            }

            repo.schema.set_data_region(region_start, data_size);
            region_start = region_start.saturating_add(data_size);
            repo.loaded = vec![None; count];
        }
        Ok(())
    }

    fn read_roots(&mut self, bytes: &[u8]) -> Result<(), SerialError> {
        let mut r = DataReader::new(bytes);
        let count = r.read_count(1)?;
        for _ in 0..count {
            let root = match self.read_target(&TypeDesc::Any, &mut r, false)? {
                Target::Null => Root::Value(Value::Null),
                Target::Value(value) => Root::Value(value),
                Target::Object(target) => Root::Object(target),
            };
            self.roots.push(root);
        }
        Ok(())
    }

    // ---- References

    /// Decodes one reference. With `skip`, or when the type did not resolve,
    /// the bytes are consumed and the target is `Null`.
    fn read_target(
        &mut self,
        declared: &TypeDesc,
        r: &mut DataReader<'_>,
        skip: bool,
    ) -> Result<Target, SerialError> {
        let tag = RefTag::decode(r.read_u8()?)?;
        let type_index = match tag {
            RefTag::Null => return Ok(Target::Null),
            RefTag::BaseType => *self
                .index
                .get(declared)
                .ok_or_else(|| SerialError::corrupt("base reference to a type without a record"))?,
            RefTag::DerivedType => r.read_u16()?,
        };
        let repo = self
            .repos
            .get(type_index as usize)
            .ok_or_else(|| SerialError::corrupt("type index out of range"))?;
        let desc = repo.desc().clone();
        let resolved = repo.schema.resolved();
        let num_objects = repo.schema.num_objects();

        let target = if desc.is_inline() {
            let codec = inline_codec(&desc)
                .ok_or_else(|| SerialError::corrupt("inline type without a codec"))?;
            if skip || !resolved {
                codec.skip_value(&desc, r)?;
                return Ok(Target::Null);
            }
            Target::Value(codec.read_value(&desc, r)?)
        } else {
            let object_index = r.read_u32()?;
            if skip || !resolved {
                return Ok(Target::Null);
            }
            if object_index >= num_objects {
                return Err(SerialError::corrupt("object index out of range"));
            }
            Target::Object(TypeRef::new(type_index, object_index))
        };

        if tag == RefTag::DerivedType && !self.registry.is_assignable(&desc, declared) {
            Warning::new(
                WarningKind::ValueDropped,
                desc.to_string(),
                alloc::format!("no longer assignable to `{declared}`, the value is dropped"),
            )
            .emit(&mut self.warnings);
            return Ok(Target::Null);
        }
        Ok(target)
    }

    /// The object at `target`, allocated and queued on first use.
    fn load_object_ref(&mut self, target: TypeRef) -> Result<Value, SerialError> {
        let repo = &mut self.repos[target.type_index as usize];
        let slot = target.object_index as usize;
        if let Some(obj) = &repo.loaded[slot] {
            return Ok(Value::Object(obj.clone()));
        }

        let desc = repo.desc().clone();
        let Some(object) = repo.codec.create_object(&desc)? else {
            return Ok(Value::Null);
        };
        let obj = ObjRef::new(object);
        repo.loaded[slot] = Some(obj.clone());
        self.located.insert(obj.addr(), target);
        self.queue.push_back(target);
        Ok(Value::Object(obj))
    }

    // ---- Hydration

    fn read_region(&mut self, target: TypeRef) -> Result<Vec<u8>, SerialError> {
        let repo = &self.repos[target.type_index as usize];
        let slot = target.object_index as usize;
        let start = repo.offsets[slot];
        let size = repo.sizes[slot];
        let end = start + size as u64;
        let data_size = repo.schema.data_size();
        if end > data_size {
            return Err(SerialError::RegionOverflow {
                ty: repo.desc().clone(),
                index: target.object_index,
                start,
                end,
                data_size,
            });
        }

        let position = self
            .data_start
            .saturating_add(repo.schema.start_data_offset())
            .saturating_add(start);
        self.reader.seek(SeekFrom::Start(position))?;
        let mut bytes = Vec::new();
        self.reader.by_ref().take(size as u64).read_to_end(&mut bytes)?;
        if bytes.len() != size as usize {
            return Err(SerialError::OutOfBounds {
                requested: size as usize,
                remaining: bytes.len(),
            });
        }
        Ok(bytes)
    }

    /// Populates the shell at `target`. Objects past the shell state are left alone.
    ///
    /// A shell that fails to load goes back to the shell state and is queued
    /// again, so a later attempt reports the same error.
    pub fn hydrate(&mut self, target: TypeRef) -> Result<(), SerialError> {
        let repo = &self.repos[target.type_index as usize];
        let Some(obj) = repo.loaded[target.object_index as usize].clone() else {
            return Ok(());
        };
        if obj.state() != ObjectState::Shell {
            return Ok(());
        }
        let codec = repo.codec.clone();

        obj.set_state(ObjectState::Hydrating);
        if let Err(err) = self.hydrate_shell(target, &obj, &*codec) {
            obj.set_state(ObjectState::Shell);
            self.queue.push_front(target);
            return Err(err);
        }
        obj.set_state(ObjectState::Hydrated);
        self.hydrated += 1;
        Ok(())
    }

    fn hydrate_shell(
        &mut self,
        target: TypeRef,
        obj: &ObjRef,
        codec: &dyn Codec,
    ) -> Result<(), SerialError> {
        let bytes = self.read_region(target)?;
        log::trace!("hydrating {:?} from {} bytes", obj, bytes.len());
        codec.preload_object_data(obj, target.object_index, &mut DataReader::new(&bytes), self)?;
        let mut r = DataReader::new(&bytes);
        codec.load_object_data(obj, target.object_index, &mut r, self)?;
        crate::cfg::debug! {
            if !r.is_empty() {
                log::debug!("{obj:?} left {} of {} bytes unread", r.remaining(), bytes.len());
            }
        }
        Ok(())
    }

    /// Hydrates every queued shell, including the ones queued on the way.
    pub fn drain(&mut self) -> Result<(), SerialError> {
        while let Some(target) = self.queue.pop_front() {
            self.hydrate(target)?;
        }
        Ok(())
    }

    pub fn update_state(&mut self) {
        self.state = if self.hydrated >= self.total {
            SessionState::Done
        } else {
            SessionState::Ready
        };
    }

    #[inline]
    pub fn hydrated(&self) -> u64 {
        self.hydrated
    }

    // ---- Roots

    #[inline]
    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    /// Root `index`, allocated but not hydrated, and its location if it is an object.
    pub fn root(&mut self, index: usize) -> Result<(Value, Option<TypeRef>), SerialError> {
        let target = match self.roots.get(index) {
            None => {
                let count = self.roots.len();
                return Err(SerialError::NoSuchRoot { index, count });
            }
            Some(Root::Value(value)) => return Ok((value.clone(), None)),
            Some(Root::Object(target)) => *target,
        };
        Ok((self.load_object_ref(target)?, Some(target)))
    }

    pub fn repos(&self) -> impl Iterator<Item = &TypeRepo> {
        self.repos.iter()
    }
}

impl<R: Read + Seek + 'static> LoadContext for LoadSession<R> {
    fn read_ref(
        &mut self,
        declared: &TypeDesc,
        r: &mut DataReader<'_>,
    ) -> Result<Value, SerialError> {
        match self.read_target(declared, r, false)? {
            Target::Null => Ok(Value::Null),
            Target::Value(value) => Ok(value),
            Target::Object(target) => self.load_object_ref(target),
        }
    }

    fn skip_ref(&mut self, declared: &TypeDesc, r: &mut DataReader<'_>) -> Result<(), SerialError> {
        self.read_target(declared, r, true).map(drop)
    }

    fn read_lazy_ref(
        &mut self,
        declared: &TypeDesc,
        r: &mut DataReader<'_>,
    ) -> Result<Slot, SerialError> {
        let target = match self.read_target(declared, r, false)? {
            Target::Null => return Ok(Slot::Value(Value::Null)),
            Target::Value(value) => return Ok(Slot::Value(value)),
            Target::Object(target) => target,
        };
        let loaded = &self.repos[target.type_index as usize].loaded;
        if let Some(obj) = &loaded[target.object_index as usize] {
            return Ok(Slot::Value(Value::Object(obj.clone())));
        }
        Ok(Slot::Lazy(Rc::new(LazyValue::new(target, self.this.clone()))))
    }

    fn hydrate_now(&mut self, value: &Value) -> Result<(), SerialError> {
        let Value::Object(obj) = value else {
            return Ok(());
        };
        match self.located.get(&obj.addr()) {
            Some(&target) => self.hydrate(target),
            None => Ok(()),
        }
    }
}

impl<R: Read + Seek + 'static> LazyResolver for LoadSession<R> {
    fn resolve(&mut self, target: TypeRef) -> Result<Value, SerialError> {
        self.state = SessionState::Hydrating;
        let value = self.load_object_ref(target)?;
        self.hydrate(target)?;
        self.drain()?;
        self.update_state();
        Ok(value)
    }
}
