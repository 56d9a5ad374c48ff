//! Python bindings for the Akyno grammar.
//!
//! Exposes the loaded [`akyno::Language`] as `akyno._akyno.Language`. Loading
//! failures raise `RuntimeError("Error loading Akyno grammar")`.
use akyno::FieldId;
use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;

/// A loaded tree-sitter grammar.
#[pyclass(name = "Language", module = "akyno._akyno", frozen)]
struct PyLanguage {
    inner: akyno::Language,
}

#[pymethods]
impl PyLanguage {
    #[getter]
    fn name(&self) -> &str {
        self.inner.name()
    }

    #[getter]
    fn node_kind_count(&self) -> usize {
        self.inner.node_kind_count()
    }

    #[getter]
    fn field_count(&self) -> usize {
        self.inner.field_count()
    }

    #[getter]
    fn start_symbol(&self) -> u16 {
        self.inner.start_symbol()
    }

    fn node_kind_for_id(&self, id: u16) -> Option<&str> {
        self.inner.node_kind_for_id(id)
    }

    #[pyo3(signature = (kind, named = true))]
    fn id_for_node_kind(&self, kind: &str, named: bool) -> Option<u16> {
        self.inner.id_for_node_kind(kind, named)
    }

    fn node_kind_is_named(&self, id: u16) -> bool {
        self.inner.node_kind_is_named(id)
    }

    fn node_kind_is_visible(&self, id: u16) -> bool {
        self.inner.node_kind_is_visible(id)
    }

    fn node_kind_is_supertype(&self, id: u16) -> bool {
        self.inner.node_kind_is_supertype(id)
    }

    fn subtypes_for_supertype(&self, id: u16) -> Vec<u16> {
        self.inner.subtypes_for_supertype(id).to_vec()
    }

    fn supertypes(&self) -> Vec<u16> {
        self.inner.supertypes()
    }

    fn field_name_for_id(&self, id: u16) -> Option<&str> {
        FieldId::new(id).and_then(|id| self.inner.field_name_for_id(id))
    }

    fn field_id_for_name(&self, name: &str) -> Option<u16> {
        self.inner.field_id_for_name(name).map(FieldId::get)
    }

    /// The `node-types.json` description, as a JSON string.
    fn node_types(&self) -> PyResult<String> {
        akyno::node_types::to_json(self.inner.node_types())
            .map_err(|e| PyRuntimeError::new_err(e.to_string()))
    }

    fn __repr__(&self) -> String {
        format!("<Language {:?}>", self.inner.name())
    }
}

/// Loads the bundled Akyno grammar.
#[pyfunction]
fn language() -> PyResult<PyLanguage> {
    akyno::language()
        .map(|inner| PyLanguage { inner })
        .map_err(|e| PyRuntimeError::new_err(e.to_string()))
}

/// The bundled `node-types.json` artifact.
#[pyfunction]
fn node_types() -> &'static str {
    akyno::NODE_TYPES
}

#[pymodule]
fn _akyno(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyLanguage>()?;
    m.add_function(wrap_pyfunction!(language, m)?)?;
    m.add_function(wrap_pyfunction!(node_types, m)?)?;
    m.add("GRAMMAR_JSON", akyno::GRAMMAR_JSON)?;
    m.add("SCOPE", akyno::SCOPE)?;
    Ok(())
}
