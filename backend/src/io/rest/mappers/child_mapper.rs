use crate::domain::commands::child::{ChildResult, CreateChildCommand, DeleteChildResult, UpdateChildCommand};
use crate::domain::models::child::{Child as DomainChild, Gender as DomainGender};
use shared::{
    Child as SharedChild, ChildListResponse, ChildResponse, CreateChildRequest, DeleteChildResponse,
    Gender as SharedGender, UpdateChildRequest,
};

/// Mapper to convert between shared Child DTOs and domain Child models.
pub struct ChildMapper;

impl ChildMapper {
    pub fn gender_to_domain(gender: SharedGender) -> DomainGender {
        match gender {
            SharedGender::Boy => DomainGender::Boy,
            SharedGender::Girl => DomainGender::Girl,
        }
    }

    pub fn gender_to_dto(gender: DomainGender) -> SharedGender {
        match gender {
            DomainGender::Boy => SharedGender::Boy,
            DomainGender::Girl => SharedGender::Girl,
        }
    }

    /// Converts a domain Child model to a shared Child DTO.
    pub fn to_dto(domain: DomainChild) -> SharedChild {
        SharedChild {
            id: domain.id,
            name: domain.name,
            gender: Self::gender_to_dto(domain.gender),
            birthday: domain.birthday.format("%Y-%m-%d").to_string(),
            picture: domain.picture,
            points: domain.points,
            created_at: domain.created_at.to_rfc3339(),
            updated_at: domain.updated_at.to_rfc3339(),
        }
    }

    pub fn to_create_command(request: CreateChildRequest) -> CreateChildCommand {
        CreateChildCommand {
            name: request.name,
            gender: Self::gender_to_domain(request.gender),
            birthday: request.birthday,
        }
    }

    pub fn to_update_command(child_id: String, request: UpdateChildRequest) -> UpdateChildCommand {
        UpdateChildCommand {
            child_id,
            name: request.name,
            gender: request.gender.map(Self::gender_to_domain),
            birthday: request.birthday,
        }
    }

    pub fn to_child_response_dto(result: ChildResult) -> ChildResponse {
        ChildResponse {
            child: Self::to_dto(result.child),
            success_message: result.success_message,
        }
    }

    pub fn to_child_list_dto(domain_children: Vec<DomainChild>) -> ChildListResponse {
        ChildListResponse {
            children: domain_children.into_iter().map(Self::to_dto).collect(),
        }
    }

    pub fn to_delete_response_dto(result: DeleteChildResult) -> DeleteChildResponse {
        DeleteChildResponse {
            success_message: result.success_message,
            removed_tasks: result.removed_tasks,
            removed_rewards: result.removed_rewards,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn test_to_dto_formats_dates() {
        let created = Utc.with_ymd_and_hms(2025, 1, 20, 10, 0, 0).unwrap();
        let child = DomainChild {
            id: "child::1737367200000::3fa2c9d1".to_string(),
            name: "Emma".to_string(),
            gender: DomainGender::Girl,
            birthday: NaiveDate::from_ymd_opt(2016, 4, 2).unwrap(),
            picture: Some("child_1737367200000_3fa2c9d1.png".to_string()),
            points: 60,
            created_at: created,
            updated_at: created,
        };

        let dto = ChildMapper::to_dto(child);
        assert_eq!(dto.birthday, "2016-04-02");
        assert_eq!(dto.gender, SharedGender::Girl);
        assert_eq!(dto.created_at, "2025-01-20T10:00:00+00:00");
        assert_eq!(dto.points, 60);
    }
}
