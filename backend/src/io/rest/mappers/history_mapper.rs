use crate::domain::commands::history::{AdjustPointsCommand, AdjustPointsResult, BalanceAudit, MarkPurchasedResult};
use crate::domain::models::history::{HistoryEntry as DomainHistoryEntry, PointAction as DomainPointAction};
use crate::io::rest::mappers::ChildMapper;
use shared::{
    AdjustPointsRequest, AdjustPointsResponse, BalanceAuditResponse, HistoryEntry as SharedHistoryEntry,
    HistoryEntryResponse, HistoryListResponse, PointAction as SharedPointAction,
};

pub struct HistoryMapper;

impl HistoryMapper {
    pub fn action_to_domain(action: SharedPointAction) -> DomainPointAction {
        match action {
            SharedPointAction::Add => DomainPointAction::Add,
            SharedPointAction::Subtract => DomainPointAction::Subtract,
        }
    }

    pub fn action_to_dto(action: DomainPointAction) -> SharedPointAction {
        match action {
            DomainPointAction::Add => SharedPointAction::Add,
            DomainPointAction::Subtract => SharedPointAction::Subtract,
        }
    }

    pub fn to_dto(domain: DomainHistoryEntry) -> SharedHistoryEntry {
        SharedHistoryEntry {
            id: domain.id,
            title: domain.title,
            points: domain.points,
            action: Self::action_to_dto(domain.action),
            date_completed: domain.date_completed.to_rfc3339(),
            purchased: domain.purchased,
        }
    }

    pub fn to_list_dto(child_id: String, entries: Vec<DomainHistoryEntry>) -> HistoryListResponse {
        HistoryListResponse {
            child_id,
            entries: entries.into_iter().map(Self::to_dto).collect(),
        }
    }

    pub fn to_adjust_command(child_id: String, request: AdjustPointsRequest) -> AdjustPointsCommand {
        AdjustPointsCommand {
            child_id,
            title: request.title,
            points: request.points,
            action: Self::action_to_domain(request.action),
        }
    }

    pub fn to_adjust_response_dto(result: AdjustPointsResult) -> AdjustPointsResponse {
        AdjustPointsResponse {
            child: ChildMapper::to_dto(result.child),
            history_entry: Self::to_dto(result.history_entry),
            success_message: result.success_message,
        }
    }

    pub fn to_entry_response_dto(result: MarkPurchasedResult) -> HistoryEntryResponse {
        HistoryEntryResponse {
            entry: Self::to_dto(result.entry),
            success_message: result.success_message,
        }
    }

    pub fn to_audit_dto(audit: BalanceAudit) -> BalanceAuditResponse {
        BalanceAuditResponse {
            child_id: audit.child_id,
            balance: audit.balance,
            ledger_total: audit.ledger_total,
            consistent: audit.consistent,
        }
    }
}
