use alloc::collections::VecDeque;
use alloc::vec::Vec;

use byteorder::{LittleEndian, WriteBytesExt};
use gr_utils::hash::{HashMap, HashSet};
use std::io::Write;

use crate::registry::TypeRegistry;
use crate::repo::{DetectEnv, TypeRepo, detect};
use crate::schema::TypeDesc;
use crate::value::Value;
use crate::wire::{DataWriter, FORMAT_VERSION, MAGIC, RefTag};
use crate::{SerialError, SerializerOptions, SessionState, Warning};

/// State of one save call.
///
/// Discovery assigns every reachable object an index in the repo of its
/// runtime type before its children are visited, so cycles and shared
/// references end up as one entry each.
pub(crate) struct SaveSession<'a> {
    registry: &'a TypeRegistry,
    options: SerializerOptions,
    repos: Vec<TypeRepo>,
    index: HashMap<TypeDesc, u16>,
    /// Types without a repo. Their values are written as null.
    suppressed: HashSet<TypeDesc>,
    parser_queue: VecDeque<(u16, u32)>,
    pub warnings: Vec<Warning>,
    pub state: SessionState,
}

impl<'a> SaveSession<'a> {
    pub fn new(registry: &'a TypeRegistry, options: SerializerOptions) -> Self {
        Self {
            registry,
            options,
            repos: Vec::new(),
            index: HashMap::default(),
            suppressed: HashSet::default(),
            parser_queue: VecDeque::new(),
            warnings: Vec::new(),
            state: SessionState::Idle,
        }
    }

    /// Index of the repo of `desc`, created on first use.
    fn repo_for(&mut self, desc: &TypeDesc) -> Result<Option<u16>, SerialError> {
        if let Some(&index) = self.index.get(desc) {
            return Ok(Some(index));
        }
        if self.suppressed.contains(desc) {
            return Ok(None);
        }

        let detected = detect(
            desc,
            &mut DetectEnv {
                registry: self.registry,
                options: self.options,
                stored: None,
                warnings: &mut self.warnings,
            },
        );
        if detected.hidden || !detected.schema.resolved() {
            self.suppressed.insert(desc.clone());
            return Ok(None);
        }
        if self.repos.len() >= u16::MAX as usize {
            return Err(SerialError::TooManyTypes);
        }

        let index = self.repos.len() as u16;
        log::trace!("type {index}: `{desc}` as {}", detected.schema.category());
        self.repos.push(TypeRepo::new(detected));
        self.index.insert(desc.clone(), index);
        Ok(Some(index))
    }

    /// Registers `value`, referenced from a site declared as `declared`.
    ///
    /// New objects are indexed and queued; their children are visited when
    /// the queue reaches them.
    pub fn add_value(&mut self, declared: &TypeDesc, value: &Value) -> Result<(), SerialError> {
        let Some(actual) = value.type_desc() else {
            return Ok(());
        };
        if !self.registry.is_assignable(&actual, declared) {
            return Err(SerialError::TypeMismatch {
                declared: declared.clone(),
                actual,
            });
        }
        let Some(type_index) = self.repo_for(&actual)? else {
            return Ok(());
        };
        let Value::Object(obj) = value else {
            return Ok(());
        };

        let repo = &mut self.repos[type_index as usize];
        if repo.object_to_index.contains_key(&obj.addr()) {
            return Ok(());
        }
        let object_index =
            u32::try_from(repo.objects.len()).map_err(|_| SerialError::TooManyObjects(actual))?;
        repo.object_to_index.insert(obj.addr(), object_index);
        repo.objects.push(obj.clone());
        self.parser_queue.push_back((type_index, object_index));
        Ok(())
    }

    /// Writes a reference to `value` from a site declared as `declared`.
    pub fn write_ref(
        &self,
        declared: &TypeDesc,
        value: &Value,
        w: &mut DataWriter,
    ) -> Result<(), SerialError> {
        let Some(actual) = value.type_desc() else {
            w.write_u8(RefTag::Null as u8);
            return Ok(());
        };
        let Some(&type_index) = self.index.get(&actual) else {
            w.write_u8(RefTag::Null as u8);
            return Ok(());
        };

        if actual == *declared {
            w.write_u8(RefTag::BaseType as u8);
        } else {
            w.write_u8(RefTag::DerivedType as u8);
            w.write_u16(type_index);
        }

        let repo = &self.repos[type_index as usize];
        match value {
            Value::Object(obj) => {
                let object_index = repo
                    .object_to_index
                    .get(&obj.addr())
                    .ok_or_else(|| SerialError::corrupt("object was not discovered"))?;
                w.write_u32(*object_index);
                Ok(())
            }
            _ => repo.codec.write_value(value, w),
        }
    }

    // ---- Phases

    /// Saves the graph reachable from `roots` into `writer`.
    pub fn run<W: Write + ?Sized>(
        &mut self,
        writer: &mut W,
        roots: &[Value],
    ) -> Result<(), SerialError> {
        self.state = SessionState::Discovering;
        self.discover(roots)?;

        self.state = SessionState::WritingSchema;
        let schema = self.write_schema()?;

        self.state = SessionState::WritingHeaders;
        let (header, data) = self.write_headers()?;
        let mut root_section = DataWriter::new();
        root_section.write_u32(
            u32::try_from(roots.len()).map_err(|_| SerialError::corrupt("too many roots"))?,
        );
        for root in roots {
            self.write_ref(&TypeDesc::Any, root, &mut root_section)?;
        }

        self.state = SessionState::WritingData;
        writer.write_all(&MAGIC)?;
        writer.write_u16::<LittleEndian>(FORMAT_VERSION)?;
        for section in [&schema, &header, &root_section] {
            let len = u32::try_from(section.len())
                .map_err(|_| SerialError::corrupt("section larger than 4 GiB"))?;
            writer.write_u32::<LittleEndian>(len)?;
            writer.write_all(section.as_slice())?;
        }
        writer.write_all(data.as_slice())?;
        writer.flush()?;

        log::debug!(
            "saved {} roots, {} types, {} data bytes",
            roots.len(),
            self.repos.len(),
            data.len()
        );
        self.state = SessionState::Done;
        Ok(())
    }

    fn discover(&mut self, roots: &[Value]) -> Result<(), SerialError> {
        for root in roots {
            self.add_value(&TypeDesc::Any, root)?;
        }
        while let Some((type_index, object_index)) = self.parser_queue.pop_front() {
            let repo = &self.repos[type_index as usize];
            let codec = repo.codec.clone();
            let obj = repo.objects[object_index as usize].clone();
            codec.add_child_objects(&obj, self)?;
        }
        Ok(())
    }

    fn write_schema(&mut self) -> Result<DataWriter, SerialError> {
        let mut w = DataWriter::new();
        w.write_u16(self.repos.len() as u16);
        for repo in &mut self.repos {
            repo.schema.set_num_objects(repo.objects.len() as u32);
            repo.schema.encode(&mut w)?;
        }
        Ok(w)
    }

    /// Encodes every payload. Returns the header section and the data section.
    fn write_headers(&mut self) -> Result<(DataWriter, DataWriter), SerialError> {
        let mut header = DataWriter::new();
        let mut data = DataWriter::new();
        let mut regions = Vec::with_capacity(self.repos.len());

        for repo in &self.repos {
            let start = data.len();
            let mut sizes = Vec::with_capacity(repo.objects.len());
            for obj in &repo.objects {
                let before = data.len();
                repo.codec.save_object(obj, &mut data, self)?;
                let size = u32::try_from(data.len() - before)
                    .map_err(|_| SerialError::corrupt("object payload larger than 4 GiB"))?;
                sizes.push(size);
            }

            let data_size = (data.len() - start) as u64;
            header.write_u64(data_size);
            for size in &sizes {
                header.write_u32(*size);
            }
            repo.codec.write_custom_header(&repo.objects, &mut header)?;
            regions.push((start as u64, data_size));
        }

        for (repo, (start, size)) in self.repos.iter_mut().zip(regions) {
            repo.schema.set_data_region(start, size);
        }
        Ok((header, data))
    }
}
