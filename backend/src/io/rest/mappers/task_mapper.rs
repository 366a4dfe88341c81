use crate::domain::commands::task::{
    CreateTaskCommand, TaskAward, TaskListQuery, TaskResult, TaskTransitionResult, UpdateTaskCommand,
};
use crate::domain::models::task::{Task as DomainTask, TaskStatus as DomainTaskStatus};
use crate::io::rest::mappers::{ChildMapper, HistoryMapper};
use shared::{
    CompleteTaskResponse, CreateTaskRequest, Task as SharedTask, TaskListRequest, TaskListResponse,
    TaskResponse, TaskStatus as SharedTaskStatus, UpdateTaskRequest,
};

pub struct TaskMapper;

impl TaskMapper {
    pub fn status_to_domain(status: SharedTaskStatus) -> DomainTaskStatus {
        match status {
            SharedTaskStatus::Pending => DomainTaskStatus::Pending,
            SharedTaskStatus::Ongoing => DomainTaskStatus::Ongoing,
            SharedTaskStatus::Confirmation => DomainTaskStatus::Confirmation,
            SharedTaskStatus::Completed => DomainTaskStatus::Completed,
        }
    }

    pub fn status_to_dto(status: DomainTaskStatus) -> SharedTaskStatus {
        match status {
            DomainTaskStatus::Pending => SharedTaskStatus::Pending,
            DomainTaskStatus::Ongoing => SharedTaskStatus::Ongoing,
            DomainTaskStatus::Confirmation => SharedTaskStatus::Confirmation,
            DomainTaskStatus::Completed => SharedTaskStatus::Completed,
        }
    }

    pub fn to_dto(domain: DomainTask) -> SharedTask {
        SharedTask {
            id: domain.id,
            title: domain.title,
            description: domain.description,
            points: domain.points,
            child_id: domain.child_id,
            status: Self::status_to_dto(domain.status),
            created_at: domain.created_at.to_rfc3339(),
            updated_at: domain.updated_at.to_rfc3339(),
        }
    }

    pub fn to_create_command(request: CreateTaskRequest) -> CreateTaskCommand {
        CreateTaskCommand {
            title: request.title,
            description: request.description,
            points: request.points,
            child_id: request.child_id,
        }
    }

    pub fn to_update_command(task_id: String, request: UpdateTaskRequest) -> UpdateTaskCommand {
        UpdateTaskCommand {
            task_id,
            title: request.title,
            description: request.description,
            points: request.points,
            child_id: request.child_id,
        }
    }

    pub fn to_list_query(request: TaskListRequest) -> TaskListQuery {
        TaskListQuery {
            child_id: request.child_id,
            status: request.status.map(Self::status_to_domain),
        }
    }

    pub fn to_task_response_dto(result: TaskResult) -> TaskResponse {
        TaskResponse {
            task: Self::to_dto(result.task),
            success_message: result.success_message,
        }
    }

    pub fn to_task_list_dto(tasks: Vec<DomainTask>) -> TaskListResponse {
        TaskListResponse {
            tasks: tasks.into_iter().map(Self::to_dto).collect(),
        }
    }

    pub fn to_transition_response_dto(result: TaskTransitionResult) -> TaskResponse {
        TaskResponse {
            task: Self::to_dto(result.task),
            success_message: result.success_message,
        }
    }

    pub fn to_complete_response_dto(task: DomainTask, award: TaskAward, success_message: String) -> CompleteTaskResponse {
        CompleteTaskResponse {
            task: Self::to_dto(task),
            child: ChildMapper::to_dto(award.child),
            history_entry: HistoryMapper::to_dto(award.history_entry),
            success_message,
        }
    }
}
