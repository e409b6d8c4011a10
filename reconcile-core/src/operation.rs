//! The catalogue of GraphQL operations the engine issues.
//!
//! Each operation carries its document text and the name of the root field
//! its payload lives under, so callers never handle query strings directly.

use std::fmt;

/// A named GraphQL operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Create a pipe.
    CreatePipe,
    /// Read a pipe by id (also used by the pipe lookup).
    ReadPipe,
    /// Update a pipe.
    UpdatePipe,
    /// Delete a pipe.
    DeletePipe,
    /// List the phase ids of a pipe (default-phase sweep after create).
    PipePhases,
    /// Create a phase.
    CreatePhase,
    /// Read a phase by id (also used by the phase lookup).
    ReadPhase,
    /// Update a phase.
    UpdatePhase,
    /// Delete a phase.
    DeletePhase,
    /// Create a phase field.
    CreateField,
    /// List the fields of a phase (fields have no direct lookup).
    PhaseFields,
    /// Update a phase field.
    UpdateField,
    /// Delete a phase field.
    DeleteField,
    /// Resolve a phase to its legacy integer repo id.
    PhaseRepo,
    /// Resolve a legacy repo id to the pipe uuid.
    PipeUuid,
    /// Create an automation.
    CreateAutomation,
    /// Read an automation by id.
    ReadAutomation,
    /// Update an automation.
    UpdateAutomation,
    /// Delete an automation.
    DeleteAutomation,
}

impl Operation {
    /// Every operation, in catalogue order.
    pub const ALL: [Operation; 19] = [
        Operation::CreatePipe,
        Operation::ReadPipe,
        Operation::UpdatePipe,
        Operation::DeletePipe,
        Operation::PipePhases,
        Operation::CreatePhase,
        Operation::ReadPhase,
        Operation::UpdatePhase,
        Operation::DeletePhase,
        Operation::CreateField,
        Operation::PhaseFields,
        Operation::UpdateField,
        Operation::DeleteField,
        Operation::PhaseRepo,
        Operation::PipeUuid,
        Operation::CreateAutomation,
        Operation::ReadAutomation,
        Operation::UpdateAutomation,
        Operation::DeleteAutomation,
    ];

    /// Short name used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::CreatePipe => "create pipe",
            Operation::ReadPipe => "read pipe",
            Operation::UpdatePipe => "update pipe",
            Operation::DeletePipe => "delete pipe",
            Operation::PipePhases => "query pipe phases",
            Operation::CreatePhase => "create phase",
            Operation::ReadPhase => "read phase",
            Operation::UpdatePhase => "update phase",
            Operation::DeletePhase => "delete phase",
            Operation::CreateField => "create field",
            Operation::PhaseFields => "read field",
            Operation::UpdateField => "update field",
            Operation::DeleteField => "delete field",
            Operation::PhaseRepo => "resolve phase repo_id",
            Operation::PipeUuid => "resolve pipe uuid",
            Operation::CreateAutomation => "create automation",
            Operation::ReadAutomation => "read automation",
            Operation::UpdateAutomation => "update automation",
            Operation::DeleteAutomation => "delete automation",
        }
    }

    /// Root field of the `data` object that carries this operation's payload.
    pub fn root_field(&self) -> &'static str {
        match self {
            Operation::CreatePipe => "createPipe",
            Operation::ReadPipe | Operation::PipePhases | Operation::PipeUuid => "pipe",
            Operation::UpdatePipe => "updatePipe",
            Operation::DeletePipe => "deletePipe",
            Operation::CreatePhase => "createPhase",
            Operation::ReadPhase | Operation::PhaseFields | Operation::PhaseRepo => "phase",
            Operation::UpdatePhase => "updatePhase",
            Operation::DeletePhase => "deletePhase",
            Operation::CreateField => "createPhaseField",
            Operation::UpdateField => "updatePhaseField",
            Operation::DeleteField => "deletePhaseField",
            Operation::CreateAutomation => "createAutomation",
            Operation::ReadAutomation => "automation",
            Operation::UpdateAutomation => "updateAutomation",
            Operation::DeleteAutomation => "deleteAutomation",
        }
    }

    /// True for state-changing operations.
    pub fn is_mutation(&self) -> bool {
        self.document().starts_with("mutation")
    }

    /// GraphQL document text.
    pub fn document(&self) -> &'static str {
        match self {
            Operation::CreatePipe => {
                "mutation($input:CreatePipeInput!){ createPipe(input:$input){ clientMutationId pipe{ id name } } }"
            }
            Operation::ReadPipe => {
                "query($id:ID!){ pipe(id:$id){ id name public organization{ id } } }"
            }
            Operation::UpdatePipe => {
                "mutation($input:UpdatePipeInput!){ updatePipe(input:$input){ pipe{ id name } } }"
            }
            Operation::DeletePipe => {
                "mutation($id:ID!){ deletePipe(input:{id:$id}){ success } }"
            }
            Operation::PipePhases => "query($id:ID!){ pipe(id:$id){ id phases { id } } }",
            Operation::CreatePhase => {
                "mutation($input:CreatePhaseInput!){ createPhase(input:$input){ phase{ id name } } }"
            }
            Operation::ReadPhase => "query($id:ID!){ phase(id:$id){ id name repo_id } }",
            Operation::UpdatePhase => {
                "mutation($input:UpdatePhaseInput!){ updatePhase(input:$input){ phase{ id name } } }"
            }
            Operation::DeletePhase => {
                "mutation($id:ID!){ deletePhase(input:{id:$id}){ clientMutationId success } }"
            }
            Operation::CreateField => {
                "mutation($input:CreatePhaseFieldInput!){ createPhaseField(input:$input){ phase_field{ id internal_id label type required } } }"
            }
            Operation::PhaseFields => {
                "query($phaseId:ID!){ phase(id:$phaseId){ fields{ id internal_id label type required } } }"
            }
            Operation::UpdateField => {
                "mutation($input:UpdatePhaseFieldInput!){ updatePhaseField(input:$input){ phase_field{ id internal_id label } } }"
            }
            Operation::DeleteField => {
                "mutation($id:ID!,$pipeUuid:ID!){ deletePhaseField(input:{ id:$id, pipeUuid:$pipeUuid }){ success } }"
            }
            Operation::PhaseRepo => "query($id:ID!){ phase(id:$id){ repo_id } }",
            Operation::PipeUuid => "query($id:ID!){ pipe(id:$id){ uuid } }",
            Operation::CreateAutomation => {
                "mutation($input:CreateAutomationInput!){ createAutomation(input:$input){ automation{ id name action_id event_id active } error_details{ object_name object_key messages } } }"
            }
            Operation::ReadAutomation => {
                "query($id:ID!){ automation(id:$id){ id name action_id event_id active event_repo{ __typename id } action_repo_v2{ __typename ... on Pipe{ id } ... on Table{ id } } } }"
            }
            Operation::UpdateAutomation => {
                "mutation($input:UpdateAutomationInput!){ updateAutomation(input:$input){ automation{ id } error_details{ object_name object_key messages } } }"
            }
            Operation::DeleteAutomation => {
                "mutation($id:ID!){ deleteAutomation(input:{id:$id}){ success } }"
            }
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
