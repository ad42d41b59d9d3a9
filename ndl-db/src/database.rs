//! Database load pipeline.
//!
//! Turns a root `.ndl` file plus a [`FileFetcher`] into an immutable
//! [`Database`]: parse all reachable namespaces, create empty object
//! infos (pass A), fill definitions (pass B), linearize, resolve member
//! types against ancestors, validate patches, and build the initial
//! member values.
//!
//! All load failures are fatal and located; no partially built database
//! escapes.

use crate::error::{DbError, Result};
use crate::fetcher::FileFetcher;
use crate::namespace::NamespaceFinder;
use crate::view::View;
use hashbrown::{HashMap, HashSet};
use ndl_core::{
    c3, DataType, Error as CoreError, Fqon, Location, Member, MemberId, MemberInfo, MetaInfo,
    Namespace, ObjectInfo, ObjectState, StateSnapshot, Value,
};
use ndl_syntax::{parse, Ast, AstMemberType, AstObject, AstValue};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info};

/// An immutable, loaded NDL database.
///
/// Holds the static object definitions and the initial state; all
/// queries and mutations go through [`View`]s created from it.
#[derive(Debug)]
pub struct Database {
    meta_info: MetaInfo,
    initial_state: StateSnapshot,
}

impl Database {
    /// Load a database from a root file.
    ///
    /// Blocking; the supplied fetcher is the only I/O boundary. Returns
    /// a located error if any step of the pipeline fails.
    pub fn load(root_filename: &str, fetcher: &dyn FileFetcher) -> Result<Arc<Database>> {
        Loader::new(fetcher).load(root_filename)
    }

    /// Static object definitions.
    pub fn meta_info(&self) -> &MetaInfo {
        &self.meta_info
    }

    /// The state produced by the load, before any patches.
    pub fn initial_state(&self) -> &StateSnapshot {
        &self.initial_state
    }

    /// Create a root view at the initial state.
    pub fn new_view(self: &Arc<Self>) -> View {
        View::root(self.clone())
    }
}

/// One parsed file with its alias/import table.
struct LoadedFile {
    namespace: Namespace,
    ast: Ast,
    finder: NamespaceFinder,
}

struct Loader<'f> {
    fetcher: &'f dyn FileFetcher,
    files: Vec<LoadedFile>,
    meta: MetaInfo,
    states: HashMap<Fqon, ObjectState>,
    new_objects: Vec<Fqon>,
}

impl<'f> Loader<'f> {
    fn new(fetcher: &'f dyn FileFetcher) -> Self {
        Self {
            fetcher,
            files: Vec::new(),
            meta: MetaInfo::new(),
            states: HashMap::new(),
            new_objects: Vec::new(),
        }
    }

    fn load(mut self, root_filename: &str) -> Result<Arc<Database>> {
        self.parse_all(root_filename)?;
        self.create_infos()?;
        self.fill_definitions()?;
        self.linearize_all()?;
        self.resolve_types()?;
        self.validate_patches()?;
        self.create_values()?;

        info!(
            files = self.files.len(),
            objects = self.meta.len(),
            "database loaded"
        );

        Ok(Arc::new(Database {
            meta_info: self.meta,
            initial_state: StateSnapshot::from_states(self.states),
        }))
    }

    /// Fetch and parse the root file and everything it transitively
    /// imports, breadth-first.
    fn parse_all(&mut self, root_filename: &str) -> Result<()> {
        let mut pending: VecDeque<(Namespace, Location)> = VecDeque::new();
        let mut requested: HashSet<Namespace> = HashSet::new();

        let root_ns = Namespace::from_filename(root_filename);
        requested.insert(root_ns.clone());
        pending.push_back((root_ns, Location::internal("load request")));

        while let Some((namespace, requested_at)) = pending.pop_front() {
            let filename = namespace.to_filename();
            debug!(file = %filename, "loading file");

            let source = self
                .fetcher
                .fetch(&filename)
                .map_err(|err| DbError::file(requested_at.clone(), &filename, err.to_string()))?;
            let ast = parse(&filename, &source)?;

            let mut finder = NamespaceFinder::new();
            for import in &ast.imports {
                let request = Namespace::new(import.namespace.text.as_ref());
                match &import.alias {
                    Some(alias) => finder.add_alias(alias, request.clone())?,
                    None => finder.add_import(request.clone()),
                }
                if requested.insert(request.clone()) {
                    pending.push_back((request, import.namespace.location.clone()));
                }
            }

            self.files.push(LoadedFile {
                namespace,
                ast,
                finder,
            });
        }

        Ok(())
    }

    /// Pass A: register an empty [`ObjectInfo`] per declared object.
    fn create_infos(&mut self) -> Result<()> {
        debug!("pass A: creating object infos");
        let meta = &mut self.meta;
        let new_objects = &mut self.new_objects;

        walk_files(&self.files, &mut |file, _ns, fqon, astobj| {
            if file.finder.check_conflict(astobj.name.as_str()) {
                return Err(CoreError::name(
                    astobj.name.location.clone(),
                    format!(
                        "object name '{}' conflicts with an import alias",
                        astobj.name.text
                    ),
                )
                .into());
            }

            meta.add_object(ObjectInfo::new(fqon.clone(), astobj.name.location.clone()))?;
            new_objects.push(fqon);
            Ok(())
        })
    }

    /// Pass B: resolve patch targets, parents, and declared member types.
    fn fill_definitions(&mut self) -> Result<()> {
        debug!("pass B: filling definitions");
        let meta = &mut self.meta;
        let states = &mut self.states;

        walk_files(&self.files, &mut |file, ns, fqon, astobj| {
            let target = astobj
                .target
                .as_ref()
                .map(|t| file.finder.find(ns, t, meta))
                .transpose()?;

            let mut adds = Vec::with_capacity(astobj.inheritance_add.len());
            for parent in &astobj.inheritance_add {
                adds.push(file.finder.find(ns, parent, meta)?);
            }

            let mut parents = Vec::with_capacity(astobj.parents.len());
            for parent in &astobj.parents {
                parents.push(file.finder.find(ns, parent, meta)?);
            }

            let mut member_infos = Vec::with_capacity(astobj.members.len());
            for astmember in &astobj.members {
                let mut member_info =
                    MemberInfo::new(astmember.name.location.clone(), astmember.override_depth);
                if let Some(ast_type) = &astmember.member_type {
                    let data_type = build_type(file, ns, meta, ast_type)?;
                    member_info.set_type(Arc::new(data_type), true);
                }
                member_infos.push((astmember.name.text.clone(), member_info));
            }

            let info = meta
                .object_mut(fqon.as_str())
                .ok_or_else(|| CoreError::internal("object info could not be retrieved"))?;
            if let Some(target) = target {
                info.set_target(target);
            }
            for parent in adds {
                info.add_inheritance_add(parent);
            }
            for (member, member_info) in member_infos {
                info.add_member(member, member_info)?;
            }

            states.insert(fqon, ObjectState::new(parents.into()));
            Ok(())
        })
    }

    /// Compute and memoize the C3 linearization of every new object.
    fn linearize_all(&mut self) -> Result<()> {
        debug!("linearizing {} objects", self.new_objects.len());
        let states = &self.states;

        let parents_of = |fqon: &Fqon| -> ndl_core::Result<Vec<Fqon>> {
            states
                .get(fqon)
                .map(|state| state.parents().to_vec())
                .ok_or_else(|| {
                    CoreError::internal(format!("no state for linearization of '{fqon}'"))
                })
        };

        for fqon in &self.new_objects {
            let state = states
                .get(fqon)
                .ok_or_else(|| CoreError::internal("object state could not be retrieved"))?;
            if state.linearization().is_some() {
                continue;
            }
            let linearization = c3::linearize(fqon, &parents_of)?;
            state.cache_linearization(linearization);
        }

        Ok(())
    }

    /// Fill member types from the unique ancestor that declares them.
    fn resolve_types(&mut self) -> Result<()> {
        debug!("resolving member types");

        for index in 0..self.new_objects.len() {
            let fqon = self.new_objects[index].clone();
            let linearization = self
                .states
                .get(&fqon)
                .and_then(|state| state.linearization())
                .cloned()
                .ok_or_else(|| CoreError::internal("missing linearization"))?;

            let member_ids: Vec<MemberId> = self
                .meta
                .object(fqon.as_str())
                .map(|info| info.members().map(|(id, _)| id.clone()).collect())
                .unwrap_or_default();

            for member in member_ids {
                let (location, initial_here) = {
                    let info = self
                        .meta
                        .object(fqon.as_str())
                        .and_then(|info| info.member(&member))
                        .ok_or_else(|| CoreError::internal("member info could not be retrieved"))?;
                    (info.location().clone(), info.is_initial_def())
                };

                // The member's type may be declared here or on exactly
                // one ancestor.
                let mut type_needed = !initial_here;
                let mut found: Option<Arc<DataType>> = None;

                for ancestor in linearization.iter().skip(1) {
                    let Some(ancestor_member) = self
                        .meta
                        .object(ancestor.as_str())
                        .and_then(|info| info.member(&member))
                    else {
                        continue;
                    };
                    if !ancestor_member.is_initial_def() {
                        continue;
                    }

                    let data_type = ancestor_member.data_type().cloned().ok_or_else(|| {
                        CoreError::internal("initial type definition has no type")
                    })?;

                    if !type_needed {
                        return Err(CoreError::type_error(
                            location,
                            format!("parent '{ancestor}' already defines type of '{member}'"),
                        )
                        .into());
                    }

                    type_needed = false;
                    found = Some(data_type);
                }

                if let Some(data_type) = found {
                    self.set_member_type(&fqon, &member, data_type)?;
                } else if type_needed {
                    // Patches may take the type from their target chain.
                    if let Some(data_type) = self.find_type_via_target(&fqon, &member)? {
                        self.set_member_type(&fqon, &member, data_type)?;
                    } else {
                        return Err(CoreError::type_error(
                            location,
                            format!("no parent defines the type of '{member}'"),
                        )
                        .into());
                    }
                }
            }
        }

        Ok(())
    }

    fn set_member_type(
        &mut self,
        fqon: &Fqon,
        member: &str,
        data_type: Arc<DataType>,
    ) -> Result<()> {
        self.meta
            .object_mut(fqon.as_str())
            .and_then(|info| info.member_mut(member))
            .ok_or_else(|| CoreError::internal("member info could not be retrieved"))?
            .set_type(data_type, false);
        Ok(())
    }

    /// Search a patch's target chain for the initial declaration of a
    /// member's type. Follows nested patch targets.
    fn find_type_via_target(
        &self,
        fqon: &Fqon,
        member: &str,
    ) -> Result<Option<Arc<DataType>>> {
        let mut guard: HashSet<Fqon> = HashSet::new();
        let mut current = self
            .meta
            .object(fqon.as_str())
            .and_then(|info| info.target().cloned());

        while let Some(target) = current {
            if !guard.insert(target.clone()) {
                break;
            }

            let linearization = self
                .states
                .get(&target)
                .and_then(|state| state.linearization())
                .cloned()
                .ok_or_else(|| CoreError::internal("missing target linearization"))?;

            for ancestor in linearization.iter() {
                let declared = self
                    .meta
                    .object(ancestor.as_str())
                    .and_then(|info| info.member(member))
                    .filter(|info| info.is_initial_def())
                    .and_then(|info| info.data_type().cloned());
                if declared.is_some() {
                    return Ok(declared);
                }
            }

            current = self
                .meta
                .object(target.as_str())
                .and_then(|info| info.target().cloned());
        }

        Ok(None)
    }

    /// Blind patching is not allowed: every member of a patch must exist
    /// on its target (directly or via ancestors).
    fn validate_patches(&self) -> Result<()> {
        debug!("validating patches");

        for fqon in &self.new_objects {
            let Some(info) = self.meta.object(fqon.as_str()) else {
                continue;
            };
            let Some(target) = info.target() else {
                continue;
            };

            for (member, member_info) in info.members() {
                if !self.member_exists_on_chain(target, member)? {
                    return Err(CoreError::type_error(
                        member_info.location().clone(),
                        format!("patch member '{member}' does not exist on target '{target}'"),
                    )
                    .into());
                }
            }
        }

        Ok(())
    }

    fn member_exists_on_chain(&self, target: &Fqon, member: &str) -> Result<bool> {
        let mut guard: HashSet<Fqon> = HashSet::new();
        let mut current = Some(target.clone());

        while let Some(object) = current {
            if !guard.insert(object.clone()) {
                break;
            }

            let linearization = self
                .states
                .get(&object)
                .and_then(|state| state.linearization())
                .cloned()
                .ok_or_else(|| CoreError::internal("missing target linearization"))?;

            for ancestor in linearization.iter() {
                if self
                    .meta
                    .object(ancestor.as_str())
                    .and_then(|info| info.member(member))
                    .is_some()
                {
                    return Ok(true);
                }
            }

            current = self
                .meta
                .object(object.as_str())
                .and_then(|info| info.target().cloned());
        }

        Ok(false)
    }

    /// Build the initial `(operator, value)` pairs from the AST.
    fn create_values(&mut self) -> Result<()> {
        debug!("creating initial member values");

        let meta = &self.meta;
        let states = &self.states;
        let mut all_members: Vec<(Fqon, HashMap<MemberId, Member>)> = Vec::new();

        walk_files(&self.files, &mut |file, ns, fqon, astobj| {
            let info = meta
                .object(fqon.as_str())
                .ok_or_else(|| CoreError::internal("object info could not be retrieved"))?;

            let mut members: HashMap<MemberId, Member> = HashMap::new();

            for astmember in &astobj.members {
                let Some(value_ast) = &astmember.value else {
                    continue;
                };
                let operation = astmember
                    .operation
                    .ok_or_else(|| CoreError::internal("member has value but no operator"))?;

                let member_info = info.member(&astmember.name.text).ok_or_else(|| {
                    CoreError::internal("member info could not be retrieved")
                })?;
                let data_type = member_info
                    .data_type()
                    .cloned()
                    .ok_or_else(|| CoreError::internal("member type unresolved"))?;

                if astmember.override_depth > 0 && !info.is_patch() {
                    return Err(CoreError::type_error(
                        astmember.name.location.clone(),
                        format!(
                            "member '{}' uses an override depth outside a patch",
                            astmember.name.text
                        ),
                    )
                    .into());
                }

                let value = build_value(
                    file,
                    ns,
                    meta,
                    value_ast,
                    &data_type,
                    &astmember.name.location,
                )?;

                if !value.allowed_operations(&data_type).contains(&operation) {
                    return Err(CoreError::type_error(
                        astmember.name.location.clone(),
                        format!(
                            "operator '{operation}' is not allowed for member '{}' of type {data_type}",
                            astmember.name.text
                        ),
                    )
                    .into());
                }

                check_object_refs(&value, &data_type, states, &astmember.name.location)?;

                members.insert(
                    astmember.name.text.clone(),
                    Member::new(astmember.override_depth, operation, value),
                );
            }

            if !members.is_empty() {
                all_members.push((fqon, members));
            }
            Ok(())
        })?;

        for (fqon, members) in all_members {
            self.states
                .get_mut(&fqon)
                .ok_or_else(|| CoreError::internal("object state could not be retrieved"))?
                .set_members(members);
        }

        Ok(())
    }
}

/// Walk every object of every file, nested objects first, like the
/// definition order requires (inner objects must exist before the outer
/// callback runs).
fn walk_files<F>(files: &[LoadedFile], callback: &mut F) -> Result<()>
where
    F: FnMut(&LoadedFile, &Namespace, Fqon, &AstObject) -> Result<()>,
{
    fn recurse<F>(
        file: &LoadedFile,
        namespace: &Namespace,
        objects: &[AstObject],
        callback: &mut F,
    ) -> Result<()>
    where
        F: FnMut(&LoadedFile, &Namespace, Fqon, &AstObject) -> Result<()>,
    {
        for astobj in objects {
            let child_ns = namespace.descend(astobj.name.as_str());
            recurse(file, &child_ns, &astobj.objects, callback)?;

            let fqon = namespace.fqon(astobj.name.as_str());
            callback(file, namespace, fqon, astobj)?;
        }
        Ok(())
    }

    for file in files {
        recurse(file, &file.namespace, &file.ast.objects, callback)?;
    }
    Ok(())
}

/// Build a [`DataType`] from its AST form.
fn build_type(
    file: &LoadedFile,
    namespace: &Namespace,
    meta: &MetaInfo,
    ast_type: &AstMemberType,
) -> Result<DataType> {
    let location = || ast_type.name.location.clone();

    match ast_type.name.as_str() {
        name @ ("int" | "float" | "text" | "bool" | "file") => {
            if ast_type.payload.is_some() {
                return Err(CoreError::type_error(
                    location(),
                    format!("fundamental type '{name}' can't have an element type"),
                )
                .into());
            }
            Ok(match name {
                "int" => DataType::Int,
                "float" => DataType::Float,
                "text" => DataType::Text,
                "bool" => DataType::Bool,
                _ => DataType::File,
            })
        }

        name @ ("set" | "orderedset") => {
            let Some(payload) = &ast_type.payload else {
                return Err(CoreError::type_error(
                    location(),
                    format!("container type '{name}' needs an element type"),
                )
                .into());
            };
            let element = build_type(file, namespace, meta, payload)?;
            let kind = if name == "set" {
                ndl_core::ContainerKind::Set
            } else {
                ndl_core::ContainerKind::OrderedSet
            };
            DataType::container(kind, element)
                .map_err(|err| CoreError::type_error(location(), err.to_string()).into())
        }

        _ => {
            if ast_type.payload.is_some() {
                return Err(CoreError::type_error(
                    location(),
                    "an object type can't have an element type",
                )
                .into());
            }
            let target = file.finder.find(namespace, &ast_type.name, meta)?;
            Ok(DataType::Object(target))
        }
    }
}

/// Build a [`Value`] from its AST form, guided by the member's type.
fn build_value(
    file: &LoadedFile,
    namespace: &Namespace,
    meta: &MetaInfo,
    ast_value: &AstValue,
    data_type: &DataType,
    location: &Location,
) -> Result<Value> {
    let mismatch = |got: &str| -> DbError {
        CoreError::type_error(
            location.clone(),
            format!("{got} value is not compatible with member type {data_type}"),
        )
        .into()
    };

    match ast_value {
        AstValue::Int(v) => match data_type {
            DataType::Int => Ok(Value::Int(*v)),
            // int literals are fine for float members
            DataType::Float => Ok(Value::Float(*v as f64)),
            _ => Err(mismatch("int")),
        },
        AstValue::Float(v) => match data_type {
            DataType::Float => Ok(Value::Float(*v)),
            _ => Err(mismatch("float")),
        },
        AstValue::Text(v) => match data_type {
            DataType::Text => Ok(Value::Text(v.clone())),
            DataType::File => Ok(Value::File(v.clone())),
            _ => Err(mismatch("text")),
        },
        AstValue::Bool(v) => match data_type {
            DataType::Bool => Ok(Value::Bool(*v)),
            _ => Err(mismatch("bool")),
        },
        AstValue::Reference(id) => match data_type {
            DataType::Object(_) => {
                let fqon = file.finder.find(namespace, id, meta)?;
                Ok(Value::ObjectRef(fqon))
            }
            _ => Err(mismatch("object reference")),
        },
        AstValue::Set(values) => {
            let Some(element_type) = data_type.element() else {
                return Err(mismatch("set"));
            };
            let mut set = hashbrown::HashSet::with_capacity(values.len());
            for value in values {
                set.insert(build_value(file, namespace, meta, value, element_type, location)?);
            }
            Ok(Value::Set(set))
        }
        AstValue::OrderedSet(values) => {
            let Some(element_type) = data_type.element() else {
                return Err(mismatch("orderedset"));
            };
            let mut set = indexmap::IndexSet::with_capacity(values.len());
            for value in values {
                set.insert(build_value(file, namespace, meta, value, element_type, location)?);
            }
            Ok(Value::OrderedSet(set))
        }
    }
}

/// Verify that object references point at objects extending the type's
/// required supertype.
fn check_object_refs(
    value: &Value,
    data_type: &DataType,
    states: &HashMap<Fqon, ObjectState>,
    location: &Location,
) -> Result<()> {
    match (value, data_type) {
        (Value::ObjectRef(fqon), DataType::Object(required)) => {
            let extends = states
                .get(fqon)
                .and_then(|state| state.linearization())
                .map(|lin| lin.iter().any(|ancestor| ancestor == required))
                .unwrap_or(false);
            if !extends {
                return Err(CoreError::type_error(
                    location.clone(),
                    format!("object '{fqon}' does not extend required type '{required}'"),
                )
                .into());
            }
            Ok(())
        }
        (Value::Set(values), _) => {
            if let Some(element_type) = data_type.element() {
                for element in values {
                    check_object_refs(element, element_type, states, location)?;
                }
            }
            Ok(())
        }
        (Value::OrderedSet(values), _) => {
            if let Some(element_type) = data_type.element() {
                for element in values {
                    check_object_refs(element, element_type, states, location)?;
                }
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
