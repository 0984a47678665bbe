// nexus-core/src/tools/schema.rs
use crate::models::tools::{
    ToolDefinition, ToolParameter, ToolParameterType, ToolParametersDefinition,
};
use std::collections::BTreeMap;

pub(crate) const READ_FILE: &str = "read_file";
pub(crate) const WRITE_FILE: &str = "write_file";
pub(crate) const LIST_DIRECTORY: &str = "list_directory";
pub(crate) const GET_CURRENT_DIRECTORY: &str = "get_current_directory";
pub(crate) const CHANGE_DIRECTORY: &str = "change_directory";
pub(crate) const CREATE_DIRECTORY: &str = "create_directory";
pub(crate) const GET_FILE_INFO: &str = "get_file_info";

fn string_param(description: &str) -> ToolParameter {
    ToolParameter {
        param_type: ToolParameterType::String,
        description: description.to_string(),
    }
}

fn definition(
    name: &str,
    description: &str,
    params: &[(&str, &str, bool)],
) -> ToolDefinition {
    let mut properties = BTreeMap::new();
    let mut required = Vec::new();
    for (param_name, param_description, is_required) in params {
        properties.insert(param_name.to_string(), string_param(param_description));
        if *is_required {
            required.push(param_name.to_string());
        }
    }
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        parameters: ToolParametersDefinition {
            param_type: "object".to_string(),
            properties,
            required,
        },
    }
}

pub(crate) fn definitions() -> Vec<ToolDefinition> {
    vec![
        definition(
            READ_FILE,
            "Read the contents of a file from the file system",
            &[("file_path", "The path to the file to read", true)],
        ),
        definition(
            WRITE_FILE,
            "Write content to a file in the file system",
            &[
                ("file_path", "The path to the file to write to", true),
                ("content", "The content to write to the file", true),
            ],
        ),
        definition(
            LIST_DIRECTORY,
            "List the files and directories in a directory",
            &[(
                "directory_path",
                "The directory to list. Defaults to the current directory",
                false,
            )],
        ),
        definition(
            GET_CURRENT_DIRECTORY,
            "Get the current working directory",
            &[],
        ),
        definition(
            CHANGE_DIRECTORY,
            "Change the current working directory",
            &[("directory_path", "The directory to change to", true)],
        ),
        definition(
            CREATE_DIRECTORY,
            "Create a directory, including any missing parent directories",
            &[("directory_path", "The path of the directory to create", true)],
        ),
        definition(
            GET_FILE_INFO,
            "Get the type, size and modification time of a file or directory",
            &[("file_path", "The path to inspect", true)],
        ),
    ]
}
