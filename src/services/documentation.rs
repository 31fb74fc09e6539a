use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the footychat backend.
#[openapi(
    paths(
        crate::routes::health::health,
        crate::routes::users::register_user,
        crate::routes::users::get_profile,
        crate::routes::users::update_profile,
        crate::routes::users::list_notifications,
        crate::routes::users::count_notifications,
        crate::routes::users::mark_notification_read,
        crate::routes::users::mark_all_notifications_read,
        crate::routes::groups::create_group,
        crate::routes::groups::list_my_groups,
        crate::routes::groups::get_group,
        crate::routes::groups::add_member,
        crate::routes::groups::change_member_role,
        crate::routes::groups::leave_group,
        crate::routes::groups::generate_invite_code,
        crate::routes::groups::join_by_invite,
        crate::routes::groups::list_messages,
        crate::routes::fields::create_field,
        crate::routes::fields::list_fields,
        crate::routes::fields::get_field,
        crate::routes::fields::quote_price,
        crate::routes::fields::check_availability,
        crate::routes::fields::available_slots,
        crate::routes::fields::block_slot,
        crate::routes::fields::weekly_schedule,
        crate::routes::games::create_game,
        crate::routes::games::list_games,
        crate::routes::games::get_game,
        crate::routes::games::confirm_attendance,
        crate::routes::games::cancel_attendance,
        crate::routes::games::cancel_game,
        crate::routes::games::generate_teams,
        crate::routes::messages::edit_message,
        crate::routes::messages::delete_message,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::user::RegisterUserRequest,
            crate::dto::user::UpdateProfileRequest,
            crate::dto::user::UserResponse,
            crate::dto::group::CreateGroupRequest,
            crate::dto::group::AddMemberRequest,
            crate::dto::group::ChangeRoleRequest,
            crate::dto::group::JoinGroupRequest,
            crate::dto::group::GroupResponse,
            crate::dto::group::InviteCodeResponse,
            crate::dto::field::CreateFieldRequest,
            crate::dto::field::FieldResponse,
            crate::dto::field::PriceResponse,
            crate::dto::field::AvailabilityResponse,
            crate::dto::field::SlotResponse,
            crate::dto::field::BlockSlotRequest,
            crate::dto::field::WeeklyScheduleEntry,
            crate::dto::game::CreateGameRequest,
            crate::dto::game::GameResponse,
            crate::dto::game::CreateGamesResponse,
            crate::dto::game::ConfirmAttendanceResponse,
            crate::dto::game::CancelAttendanceResponse,
            crate::dto::notification::NotificationResponse,
            crate::dto::notification::UnreadCountResponse,
            crate::dto::notification::MarkAllReadResponse,
            crate::dto::chat::MessageResponse,
            crate::dto::chat::EditMessageRequest,
            crate::dto::chat::ClientMessage,
            crate::dto::chat::ServerMessage,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "Registration and profiles"),
        (name = "groups", description = "Groups and membership"),
        (name = "fields", description = "Venues, pricing and availability"),
        (name = "games", description = "Games, attendance and teams"),
        (name = "notifications", description = "In-app notification inbox"),
        (name = "chat", description = "Group chat over REST and WebSocket"),
    )
)]
pub struct ApiDoc;
