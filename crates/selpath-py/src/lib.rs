//! Python bindings for selpath.

use pyo3::create_exception;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use selpath::{build, envelope, BuildOptions, ParseError};

create_exception!(
    _selpath,
    SelectorError,
    PyValueError,
    "Raised when a path expression or selector envelope is rejected."
);

fn to_py_err(err: ParseError) -> PyErr {
    SelectorError::new_err(err.to_string())
}

/// Compile a path expression and return the selector document as JSON.
#[pyfunction]
#[pyo3(signature = (path, *, field_only = false, match_path = false))]
fn selector_from_path(path: &str, field_only: bool, match_path: bool) -> PyResult<String> {
    let options = if field_only {
        BuildOptions::field_only()
    } else {
        BuildOptions::index_aware()
    }
    .with_match_intermediate(match_path);

    build(path, &options, None)
        .map(|spec| spec.to_json())
        .map_err(to_py_err)
}

/// Load a `{"selector": ...}` envelope and return the compiled selector
/// document as canonical JSON.
#[pyfunction]
fn selector_from_json(json: &str) -> PyResult<String> {
    envelope::from_json(json)
        .map(|spec| spec.to_json())
        .map_err(to_py_err)
}

#[pymodule]
fn _selpath(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("SelectorError", m.py().get_type::<SelectorError>())?;
    m.add_function(wrap_pyfunction!(selector_from_path, m)?)?;
    m.add_function(wrap_pyfunction!(selector_from_json, m)?)?;
    Ok(())
}
